use nalgebra::Matrix1x4;
use num::Float;
use std::fmt::Debug;

/* ------------------------------------------------------------------------------
 * Type aliases
 * ------------------------------------------------------------------------------ */
/// Center x, center y, width, height.
pub type Cxcywh<T> = Matrix1x4<T>;

/// Floor applied to the union area so degenerate boxes never divide by zero.
pub const IOU_EPS: f64 = 1e-6;

/* ------------------------------------------------------------------------------
 * Rect struct
 * ------------------------------------------------------------------------------ */
#[derive(Debug, Clone, PartialEq)]
pub struct Rect<T>
where
    T: Debug + Float + 'static,
{
    tlwh: Matrix1x4<T>,
}

impl<T> Rect<T>
where
    T: Debug + Float + 'static,
{
    pub fn new(x: T, y: T, width: T, height: T) -> Self {
        Self {
            tlwh: Matrix1x4::new(x, y, width, height),
        }
    }

    /// Create Rect from [x1, y1, x2, y2] format
    pub fn from_xyxy(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Create Rect from its center and size.
    pub fn from_cxcywh(cx: T, cy: T, width: T, height: T) -> Self {
        let two = T::one() + T::one();
        Self::new(cx - width / two, cy - height / two, width, height)
    }

    #[inline(always)]
    pub fn x(&self) -> T {
        self.tlwh[(0, 0)]
    }

    #[inline(always)]
    pub fn y(&self) -> T {
        self.tlwh[(0, 1)]
    }

    #[inline(always)]
    pub fn width(&self) -> T {
        self.tlwh[(0, 2)]
    }

    #[inline(always)]
    pub fn height(&self) -> T {
        self.tlwh[(0, 3)]
    }

    /// `(x2 - x1) * (y2 - y1)`, negative for inverted boxes.
    pub fn area(&self) -> T {
        self.width() * self.height()
    }

    pub fn center(&self) -> (T, T) {
        let two = T::one() + T::one();
        (
            self.x() + self.width() / two,
            self.y() + self.height() / two,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.tlwh.iter().all(|v| v.is_finite())
    }

    /// Get bounding box as [x1, y1, x2, y2] format
    pub fn get_xyxy(&self) -> [T; 4] {
        [
            self.x(),
            self.y(),
            self.x() + self.width(),
            self.y() + self.height(),
        ]
    }

    pub fn get_cxcywh(&self) -> Cxcywh<T> {
        let (cx, cy) = self.center();
        Matrix1x4::new(cx, cy, self.width(), self.height())
    }

    pub fn calc_iou(&self, other: &Rect<T>) -> T {
        let [ax1, ay1, ax2, ay2] = self.get_xyxy();
        let [bx1, by1, bx2, by2] = other.get_xyxy();

        let iw = (ax2.min(bx2) - ax1.max(bx1)).max(T::zero());
        let ih = (ay2.min(by2) - ay1.max(by1)).max(T::zero());
        let intersection = iw * ih;

        let union = self.area() + other.area() - intersection;
        let eps = T::from(IOU_EPS).unwrap_or_else(T::epsilon);
        intersection / union.max(eps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearly_eq::assert_nearly_eq;

    #[test]
    fn test_xyxy_conversions() {
        let rect = Rect::from_xyxy(10.0f32, 20.0, 30.0, 60.0);
        assert_eq!(rect.width(), 20.0);
        assert_eq!(rect.height(), 40.0);
        assert_eq!(rect.get_xyxy(), [10.0, 20.0, 30.0, 60.0]);
        assert_eq!(rect.center(), (20.0, 40.0));

        let same = Rect::from_cxcywh(20.0f32, 40.0, 20.0, 40.0);
        assert_eq!(rect, same);
    }

    #[test]
    fn test_area_has_no_pixel_offset() {
        let rect = Rect::from_xyxy(0.0f32, 0.0, 10.0, 10.0);
        assert_eq!(rect.area(), 100.0);
    }

    #[test]
    fn test_iou_identical() {
        let a = Rect::from_xyxy(0.0f32, 0.0, 10.0, 10.0);
        assert_nearly_eq!(a.calc_iou(&a.clone()), 1.0, 1e-6);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = Rect::from_xyxy(100.0f32, 100.0, 200.0, 200.0);
        let b = Rect::from_xyxy(110.0f32, 110.0, 210.0, 210.0);
        // 8100 / (20000 - 8100)
        assert_nearly_eq!(a.calc_iou(&b), 0.6806723, 1e-5);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = Rect::from_xyxy(0.0f32, 0.0, 10.0, 10.0);
        let b = Rect::from_xyxy(20.0f32, 20.0, 30.0, 30.0);
        assert_eq!(a.calc_iou(&b), 0.0);
    }

    #[test]
    fn test_iou_degenerate_boxes() {
        let a = Rect::from_xyxy(5.0f32, 5.0, 5.0, 5.0);
        let iou = a.calc_iou(&a.clone());
        assert!(iou.is_finite());
        assert_eq!(iou, 0.0);
    }
}
