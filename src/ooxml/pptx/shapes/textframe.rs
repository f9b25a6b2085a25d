/// Text frame for reading and rewriting the text body of a shape.
use crate::common::unit::centipoints_to_pt;
use crate::common::xml::{append_text, attr_value, find_children, splice};
use crate::common::RGBColor;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::format::{Autofit, TextAlign, TextFormat};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::ops::Range;

/// One `a:p` of a text body.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    /// Byte range within the shape XML
    range: Range<usize>,
    /// Plain text; `a:br` becomes `\n`
    pub text: String,
    /// `a:pPr@algn`
    pub alignment: Option<TextAlign>,
    /// `a:pPr@lvl`
    pub level: u32,
    /// Formatting of the first run, or of `a:endParaRPr` when the paragraph
    /// has no runs
    pub format: TextFormat,
    /// Number of `a:r` / `a:fld` runs
    pub run_count: usize,
}

impl Paragraph {
    /// A spacer paragraph has no visible text.
    #[inline]
    pub fn is_spacer(&self) -> bool {
        self.text.trim().is_empty()
    }

    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Parse one `a:p` element. `offset` is the element's position inside
    /// the shape XML.
    fn parse(xml: &[u8], offset: usize) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);
        let mut buf = Vec::new();

        let mut text = String::new();
        let mut alignment = None;
        let mut level = 0u32;
        let mut run_count = 0usize;
        let mut run_format: Option<TextFormat> = None;
        let mut end_format: Option<TextFormat> = None;

        let mut in_run = false;
        let mut in_text = false;
        let mut capture: Option<(Capture, TextFormat)> = None;
        let mut in_fill = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"pPr" => read_ppr(&e, &mut alignment, &mut level),
                    b"r" | b"fld" => {
                        in_run = true;
                        run_count += 1;
                    },
                    b"rPr" if in_run && run_format.is_none() => {
                        capture = Some((Capture::Run, read_rpr_attrs(&e)));
                    },
                    b"endParaRPr" => capture = Some((Capture::EndPara, read_rpr_attrs(&e))),
                    b"solidFill" if capture.is_some() => in_fill = true,
                    b"t" if in_run => in_text = true,
                    b"br" => text.push('\n'),
                    b"srgbClr" if in_fill => read_color(&e, &mut capture),
                    _ => {},
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"pPr" => read_ppr(&e, &mut alignment, &mut level),
                    b"rPr" if in_run && run_format.is_none() => run_format = Some(read_rpr_attrs(&e)),
                    b"endParaRPr" => end_format = Some(read_rpr_attrs(&e)),
                    b"br" => text.push('\n'),
                    b"latin" => {
                        if let Some((_, format)) = capture.as_mut() {
                            format.font = attr_value(&e, b"typeface").filter(|f| !f.is_empty());
                        }
                    },
                    b"srgbClr" if in_fill => read_color(&e, &mut capture),
                    _ => {},
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"r" | b"fld" => in_run = false,
                    b"t" => in_text = false,
                    b"solidFill" => in_fill = false,
                    b"rPr" | b"endParaRPr" => match capture.take() {
                        Some((Capture::Run, format)) => run_format = Some(format),
                        Some((Capture::EndPara, format)) => end_format = Some(format),
                        None => {},
                    },
                    _ => {},
                },
                Event::Eof => break,
                other => {
                    if in_text {
                        append_text(&mut text, &other);
                    }
                },
            }
            buf.clear();
        }

        Ok(Self {
            range: offset..offset + xml.len(),
            text,
            alignment,
            level,
            format: run_format.or(end_format).unwrap_or_default(),
            run_count,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Capture {
    Run,
    EndPara,
}

fn read_ppr(e: &BytesStart<'_>, alignment: &mut Option<TextAlign>, level: &mut u32) {
    if let Some(algn) = attr_value(e, b"algn") {
        *alignment = TextAlign::from_attr(&algn);
    }
    if let Some(lvl) = attr_value(e, b"lvl") {
        *level = atoi_simd::parse::<u32>(lvl.as_bytes()).unwrap_or(0);
    }
}

/// `a:srgbClr@val` of the fill being captured; modifiers such as `a:lumMod`
/// are not applied.
fn read_color(e: &BytesStart<'_>, capture: &mut Option<(Capture, TextFormat)>) {
    if let Some((_, format)) = capture.as_mut() {
        format.color = attr_value(e, b"val").and_then(|v| RGBColor::from_hex(&v));
    }
}

fn read_rpr_attrs(e: &BytesStart<'_>) -> TextFormat {
    let flag = |name: &[u8]| attr_value(e, name).map(|v| v == "1" || v == "true");
    TextFormat {
        font: None,
        size: attr_value(e, b"sz")
            .and_then(|v| atoi_simd::parse::<u32>(v.as_bytes()).ok())
            .map(centipoints_to_pt),
        bold: flag(b"b"),
        italic: flag(b"i"),
        color: None,
    }
}

/// The `p:txBody` of a shape.
///
/// All ranges are relative to the shape XML passed to [`TextFrame::parse`].
#[derive(Debug, Clone)]
pub struct TextFrame {
    body_pr: Option<Range<usize>>,
    paragraphs: Vec<Paragraph>,
}

impl TextFrame {
    /// Parse the text body of a shape. Returns `Ok(None)` when the shape has
    /// no `txBody`.
    pub fn parse(shape_xml: &[u8]) -> Result<Option<Self>> {
        let Some((_, children)) = find_children(shape_xml, b"txBody")? else {
            return Ok(None);
        };

        let mut body_pr = None;
        let mut paragraphs = Vec::new();
        for child in children {
            if child.is(b"bodyPr") {
                body_pr = Some(child.outer);
            } else if child.is(b"p") {
                paragraphs.push(Paragraph::parse(&shape_xml[child.outer.clone()], child.outer.start)?);
            }
        }

        Ok(Some(Self { body_pr, paragraphs }))
    }

    #[inline]
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Extract all text, one line per paragraph.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rewrite the shape with new paragraph markup.
    ///
    /// `replacements[i]`, when `Some`, replaces paragraph `i`; other
    /// paragraphs are kept byte for byte. The body's autofit element is set
    /// to `autofit`; the rest of `a:bodyPr` is preserved.
    pub fn rewrite(&self, shape_xml: &[u8], replacements: &[Option<String>], autofit: Autofit) -> Result<Vec<u8>> {
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();

        if let Some(range) = &self.body_pr {
            edits.push((range.clone(), body_pr_with_autofit(&shape_xml[range.clone()], autofit)?));
        }
        for (paragraph, replacement) in self.paragraphs.iter().zip(replacements) {
            if let Some(xml) = replacement {
                edits.push((paragraph.range(), xml.clone()));
            }
        }

        Ok(splice(shape_xml, edits))
    }
}

/// Rebuild an `a:bodyPr` element with its autofit child replaced.
///
/// The autofit choice sits after `a:prstTxWarp` and before the 3-D and
/// extension children in the schema sequence.
fn body_pr_with_autofit(xml: &[u8], autofit: Autofit) -> Result<String> {
    let (body, children) = find_children(xml, b"bodyPr")?
        .ok_or_else(|| OoxmlError::InvalidFormat("missing a:bodyPr".to_string()))?;
    let text = std::str::from_utf8(xml)?;

    let autofit_xml = match autofit {
        Autofit::ShapeToFitText => "<a:spAutoFit/>",
        Autofit::ShrinkTextOnOverflow => "<a:normAutofit/>",
    };

    let (open_tag, close_tag) = match &body.inner {
        Some(inner) => (
            text[..inner.start].to_string(),
            text[inner.end..body.outer.end].to_string(),
        ),
        None => {
            let open = text[..body.outer.end].trim_end_matches("/>").trim_end();
            let qname = open
                .trim_start_matches('<')
                .split(|c: char| c.is_whitespace())
                .next()
                .unwrap_or("a:bodyPr");
            (format!("{}>", open), format!("</{}>", qname))
        },
    };

    let mut out = open_tag;
    let mut inserted = false;
    for child in &children {
        if child.is(b"noAutofit") || child.is(b"normAutofit") || child.is(b"spAutoFit") {
            continue;
        }
        if !inserted && !child.is(b"prstTxWarp") {
            out.push_str(autofit_xml);
            inserted = true;
        }
        out.push_str(&text[child.outer.clone()]);
    }
    if !inserted {
        out.push_str(autofit_xml);
    }
    out.push_str(&close_tag);
    Ok(out)
}
