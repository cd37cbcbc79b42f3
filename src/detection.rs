use crate::{error::TrackError, rect::Rect};

/*------------------------------------------------------------------------------
Detection struct
------------------------------------------------------------------------------*/

/// One detector output for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub rect: Rect<f32>,
    pub score: f32,
    pub class_id: Option<usize>,
}

impl Detection {
    pub fn new(rect: Rect<f32>, score: f32, class_id: Option<usize>) -> Self {
        Self {
            rect,
            score,
            class_id,
        }
    }

    pub fn from_xyxy(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self::new(Rect::from_xyxy(x1, y1, x2, y2), score, None)
    }

    pub fn get_rect(&self) -> &Rect<f32> {
        &self.rect
    }

    pub fn get_score(&self) -> f32 {
        self.score
    }

    pub fn area(&self) -> f32 {
        self.rect.area()
    }

    pub(crate) fn validate(&self) -> Result<(), TrackError> {
        if !self.rect.is_finite() {
            return Err(TrackError::InvalidDetection(format!(
                "non-finite box {:?}",
                self.rect.get_xyxy()
            )));
        }
        if !self.score.is_finite() {
            return Err(TrackError::InvalidDetection(format!(
                "non-finite score {}",
                self.score
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_nan() {
        let det = Detection::from_xyxy(0.0, 0.0, f32::NAN, 10.0, 0.9);
        assert!(matches!(
            det.validate(),
            Err(TrackError::InvalidDetection(_))
        ));

        let det = Detection::from_xyxy(0.0, 0.0, 10.0, 10.0, f32::INFINITY);
        assert!(det.validate().is_err());
    }

    #[test]
    fn test_area() {
        let det = Detection::from_xyxy(2.0, 3.0, 7.0, 5.0, 0.5);
        assert_eq!(det.area(), 10.0);
        assert_eq!(det.class_id, None);
    }
}
