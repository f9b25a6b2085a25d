//! Layout calculator: image sizing, alignment and text container geometry.
//!
//! All functions are pure and work in inches; [`Rect::to_geometry`]
//! converts to EMUs at the boundary with the slide writer.

use crate::common::unit::{emu_to_inches, inches_to_emu};
use crate::deck::config::{FixedPosition, HorizontalAlign, ImageAlignment, SizingMode, SlideLayoutConfig, VerticalAlign};
use crate::ooxml::pptx::ShapeGeometry;

/// Margin kept free at the right and bottom of an auto-flow text container.
const TEXT_MARGIN: f64 = 0.5;
/// Height of a fixed-position text container.
pub const FIXED_TEXT_HEIGHT: f64 = 1.5;

/// An axis-aligned rectangle in inches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn from_geometry(geometry: ShapeGeometry) -> Self {
        Self {
            left: emu_to_inches(geometry.x),
            top: emu_to_inches(geometry.y),
            width: emu_to_inches(geometry.cx),
            height: emu_to_inches(geometry.cy),
        }
    }

    pub fn to_geometry(&self) -> ShapeGeometry {
        ShapeGeometry::new(
            inches_to_emu(self.left),
            inches_to_emu(self.top),
            inches_to_emu(self.width),
            inches_to_emu(self.height),
        )
    }
}

/// Output size of an image of natural size `natural` (any unit, only the
/// ratio matters) in `bounds` inches.
///
/// A natural size with a zero or non-finite side has no usable aspect
/// ratio; the bounds are returned as they are.
pub fn fit_image(natural: (f64, f64), bounds: (f64, f64), mode: SizingMode) -> (f64, f64) {
    let (nw, nh) = natural;
    let (max_w, max_h) = bounds;
    if !(nw.is_finite() && nh.is_finite()) || nw <= 0.0 || nh <= 0.0 {
        return bounds;
    }

    match mode {
        SizingMode::FitBox => {
            let scale = (max_w / nw).min(max_h / nh);
            (nw * scale, nh * scale)
        },
        SizingMode::FitWidth => (max_w, nh * (max_w / nw)),
        SizingMode::FitHeight => (nw * (max_h / nh), max_h),
        SizingMode::Stretch => (max_w, max_h),
    }
}

/// Origin `(left, top)` of an item of `size` aligned inside `bbox`.
pub fn align_in_box(size: (f64, f64), bbox: Rect, alignment: ImageAlignment) -> (f64, f64) {
    let (w, h) = size;
    let top = match alignment.vertical {
        VerticalAlign::Top => bbox.top,
        VerticalAlign::Center => bbox.top + (bbox.height - h) / 2.0,
        VerticalAlign::Bottom => bbox.top + bbox.height - h,
    };
    let left = match alignment.horizontal {
        HorizontalAlign::Left => bbox.left,
        HorizontalAlign::Center => bbox.left + (bbox.width - w) / 2.0,
        HorizontalAlign::Right => bbox.left + bbox.width - w,
    };
    (left, top)
}

/// Size an image for `bbox` and align it there.
pub fn place_image(natural: (f64, f64), bbox: Rect, mode: SizingMode, alignment: ImageAlignment) -> Rect {
    let (width, height) = fit_image(natural, (bbox.width, bbox.height), mode);
    let (left, top) = align_in_box((width, height), bbox, alignment);
    Rect::new(left, top, width, height)
}

/// Image bounding box of a blank slide.
///
/// The box has the configured size; its horizontal anchor follows the
/// horizontal image alignment. Left keeps `img_left`, right mirrors it from
/// the right slide edge, center ignores it.
pub fn blank_image_box(config: &SlideLayoutConfig) -> Rect {
    let (slide_w, _) = config.slide_size();
    let alignment = config.image_alignment();
    let left = match alignment.horizontal {
        HorizontalAlign::Left => config.img_left,
        HorizontalAlign::Right => (slide_w - config.img_width - config.img_left).max(0.0),
        HorizontalAlign::Center => (slide_w - config.img_width) / 2.0,
    };
    Rect::new(left, config.img_top, config.img_width, config.img_height)
}

/// The shared container of auto-flow text columns.
pub fn auto_text_box(config: &SlideLayoutConfig) -> Rect {
    let (slide_w, slide_h) = config.slide_size();
    Rect::new(
        config.text_left,
        config.text_top,
        (slide_w - config.text_left - TEXT_MARGIN).max(1.0),
        (slide_h - config.text_top - TEXT_MARGIN).max(TEXT_MARGIN),
    )
}

/// The container of one fixed-position column. Depends only on the
/// column's own position settings and the slide size.
pub fn fixed_text_box(position: FixedPosition, config: &SlideLayoutConfig) -> Rect {
    let (slide_w, _) = config.slide_size();
    let width = position.width.filter(|w| *w > 0.0).unwrap_or(slide_w - 1.0);
    Rect::new(position.left, position.top, width, FIXED_TEXT_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::config::Orientation;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn align(vertical: VerticalAlign, horizontal: HorizontalAlign) -> ImageAlignment {
        ImageAlignment { vertical, horizontal }
    }

    #[test]
    fn test_stretch_ignores_natural_size() {
        assert_eq!(fit_image((1920.0, 1080.0), (4.0, 3.0), SizingMode::Stretch), (4.0, 3.0));
    }

    #[test]
    fn test_fit_modes() {
        let (w, h) = fit_image((1920.0, 1080.0), (4.0, 3.0), SizingMode::FitBox);
        assert!((w - 4.0).abs() < EPS);
        assert!((h - 2.25).abs() < EPS);

        let (w, h) = fit_image((100.0, 200.0), (4.0, 3.0), SizingMode::FitBox);
        assert!((w - 1.5).abs() < EPS);
        assert!((h - 3.0).abs() < EPS);

        assert_eq!(fit_image((100.0, 50.0), (4.0, 3.0), SizingMode::FitWidth), (4.0, 2.0));
        assert_eq!(fit_image((100.0, 50.0), (4.0, 3.0), SizingMode::FitHeight), (6.0, 3.0));
    }

    #[test]
    fn test_degenerate_natural_size() {
        assert_eq!(fit_image((0.0, 50.0), (4.0, 3.0), SizingMode::FitBox), (4.0, 3.0));
        assert_eq!(fit_image((10.0, f64::NAN), (4.0, 3.0), SizingMode::FitWidth), (4.0, 3.0));
    }

    #[test]
    fn test_bottom_right_alignment() {
        let bbox = Rect::new(1.0, 1.0, 5.0, 5.0);
        let origin = align_in_box((2.0, 1.0), bbox, align(VerticalAlign::Bottom, HorizontalAlign::Right));
        assert_eq!(origin, (4.0, 5.0));
    }

    #[test]
    fn test_top_left_and_center() {
        let bbox = Rect::new(1.0, 2.0, 6.0, 4.0);
        assert_eq!(
            align_in_box((2.0, 1.0), bbox, align(VerticalAlign::Top, HorizontalAlign::Left)),
            (1.0, 2.0)
        );
        assert_eq!(align_in_box((2.0, 1.0), bbox, ImageAlignment::default()), (3.0, 3.5));
    }

    #[test]
    fn test_blank_image_box() {
        let mut config = SlideLayoutConfig {
            orientation: Orientation::Landscape,
            img_width: 4.0,
            img_height: 3.0,
            img_left: 0.5,
            img_top: 1.0,
            ..Default::default()
        };
        config.image_alignment.horizontal = HorizontalAlign::Left;
        assert_eq!(blank_image_box(&config), Rect::new(0.5, 1.0, 4.0, 3.0));
        config.image_alignment.horizontal = HorizontalAlign::Right;
        assert_eq!(blank_image_box(&config), Rect::new(5.5, 1.0, 4.0, 3.0));
        config.image_alignment.horizontal = HorizontalAlign::Center;
        assert_eq!(blank_image_box(&config), Rect::new(3.0, 1.0, 4.0, 3.0));

        config.img_width = 12.0;
        config.image_alignment.horizontal = HorizontalAlign::Right;
        assert_eq!(blank_image_box(&config).left, 0.0);
    }

    #[test]
    fn test_text_boxes() {
        let config = SlideLayoutConfig {
            orientation: Orientation::Portrait,
            text_left: 0.5,
            text_top: 5.0,
            ..Default::default()
        };
        assert_eq!(auto_text_box(&config), Rect::new(0.5, 5.0, 6.5, 4.5));

        let fixed = FixedPosition { top: 8.0, left: 1.0, width: None };
        assert_eq!(fixed_text_box(fixed, &config), Rect::new(1.0, 8.0, 6.5, FIXED_TEXT_HEIGHT));
        let fixed = FixedPosition { top: 8.0, left: 1.0, width: Some(3.0) };
        assert_eq!(fixed_text_box(fixed, &config).width, 3.0);

        let crowded = SlideLayoutConfig { text_left: 7.0, text_top: 9.8, ..config };
        let rect = auto_text_box(&crowded);
        assert_eq!(rect.width, 1.0);
        assert_eq!(rect.height, TEXT_MARGIN);
    }

    #[test]
    fn test_geometry_conversion() {
        let rect = Rect::new(0.5, 1.0, 5.5, 4.0);
        assert_eq!(rect.to_geometry(), ShapeGeometry::new(457_200, 914_400, 5_029_200, 3_657_600));
        assert_eq!(Rect::from_geometry(rect.to_geometry()), rect);
    }

    fn sizing_mode() -> impl Strategy<Value = SizingMode> {
        prop_oneof![Just(SizingMode::FitBox), Just(SizingMode::FitWidth), Just(SizingMode::FitHeight)]
    }

    fn alignment() -> impl Strategy<Value = ImageAlignment> {
        (
            prop_oneof![Just(VerticalAlign::Top), Just(VerticalAlign::Center), Just(VerticalAlign::Bottom)],
            prop_oneof![Just(HorizontalAlign::Left), Just(HorizontalAlign::Center), Just(HorizontalAlign::Right)],
        )
            .prop_map(|(vertical, horizontal)| ImageAlignment { vertical, horizontal })
    }

    proptest! {
        #[test]
        fn prop_aspect_ratio_preserved(
            nw in 1.0f64..5000.0, nh in 1.0f64..5000.0,
            max_w in 0.5f64..20.0, max_h in 0.5f64..20.0,
            mode in sizing_mode(),
        ) {
            let (w, h) = fit_image((nw, nh), (max_w, max_h), mode);
            prop_assert!((w / h - nw / nh).abs() <= 1e-9 * (nw / nh).max(1.0));
            if mode == SizingMode::FitBox {
                prop_assert!(w <= max_w + 1e-9 && h <= max_h + 1e-9);
            }
        }

        #[test]
        fn prop_stretch_equals_bounds(
            nw in 0.0f64..5000.0, nh in 0.0f64..5000.0,
            max_w in 0.5f64..20.0, max_h in 0.5f64..20.0,
        ) {
            prop_assert_eq!(fit_image((nw, nh), (max_w, max_h), SizingMode::Stretch), (max_w, max_h));
        }

        #[test]
        fn prop_alignment_boundaries(
            left in -5.0f64..10.0, top in -5.0f64..10.0,
            bw in 0.5f64..10.0, bh in 0.5f64..10.0,
            w in 0.1f64..10.0, h in 0.1f64..10.0,
            alignment in alignment(),
        ) {
            let bbox = Rect::new(left, top, bw, bh);
            let (x, y) = align_in_box((w, h), bbox, alignment);
            match alignment.vertical {
                VerticalAlign::Top => { prop_assert_eq!(y, bbox.top); }
                VerticalAlign::Bottom => { prop_assert!((y + h - bbox.bottom()).abs() < EPS); }
                VerticalAlign::Center => { prop_assert!(((y - bbox.top) - (bbox.bottom() - (y + h))).abs() < EPS); }
            }
            match alignment.horizontal {
                HorizontalAlign::Left => { prop_assert_eq!(x, bbox.left); }
                HorizontalAlign::Right => { prop_assert!((x + w - bbox.right()).abs() < EPS); }
                HorizontalAlign::Center => { prop_assert!(((x - bbox.left) - (bbox.right() - (x + w))).abs() < EPS); }
            }
        }
    }
}
