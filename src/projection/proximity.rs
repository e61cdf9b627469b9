use crate::models::review::{ FlaggedPoint, PointCategory, ProjectedPoint };

pub const DEFAULT_BUFFER_RADIUS: f64 = 90.0;
pub const MIN_BUFFER_RADIUS: f64 = 10.0;
pub const MAX_BUFFER_RADIUS: f64 = 150.0;

/// Buffer radius applied around AI-generated points, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityConfig {
    pub default_radius: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self { default_radius: DEFAULT_BUFFER_RADIUS }
    }
}

impl ProximityConfig {
    pub fn new(default_radius: f64) -> Self {
        Self { default_radius: clamp_radius(default_radius) }
    }

    pub fn radius_for(&self, point: &ProjectedPoint) -> f64 {
        point.buffer_radius.map(clamp_radius).unwrap_or(self.default_radius)
    }
}

pub fn clamp_radius(radius: f64) -> f64 {
    if radius.is_nan() {
        return DEFAULT_BUFFER_RADIUS;
    }
    radius.clamp(MIN_BUFFER_RADIUS, MAX_BUFFER_RADIUS)
}

/// Plot geometry of the review scatter plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
}

impl Default for PlotArea {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            margin_top: 20.0,
            margin_right: 20.0,
            margin_bottom: 50.0,
            margin_left: 50.0,
        }
    }
}

impl PlotArea {
    pub fn inner_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn inner_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom
    }
}

/// Linear map from a data domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Builds a scale over the extent of `values`; an empty input gives a
    /// zero-width domain.
    pub fn from_extent(values: impl Iterator<Item = f64>, range: (f64, f64)) -> Self {
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if lo > hi {
            return Self::new((0.0, 0.0), range);
        }
        Self::new((lo, hi), range)
    }

    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span.abs() < f64::EPSILON {
            return (r0 + r1) / 2.0;
        }
        r0 + ((value - d0) / span) * (r1 - r0)
    }
}

/// Screen coordinates for a set of points, x to the right and y downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenScale {
    x: LinearScale,
    y: LinearScale,
}

impl ScreenScale {
    pub fn fit(points: &[ProjectedPoint], area: &PlotArea) -> Self {
        Self {
            x: LinearScale::from_extent(points.iter().map(|p| p.x), (0.0, area.inner_width())),
            y: LinearScale::from_extent(points.iter().map(|p| p.y), (area.inner_height(), 0.0)),
        }
    }

    pub fn apply(&self, point: &ProjectedPoint) -> (f64, f64) {
        (self.x.apply(point.x), self.y.apply(point.y))
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// A point placed on screen together with its own buffer radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub is_student_response: bool,
    pub position: (f64, f64),
    pub radius: f64,
}

/// Returns, for each placed point, whether it is a student point lying
/// inside the buffer circle of at least one AI-generated point. Pairwise scan.
pub fn misconduct_flags(placed: &[ScreenPoint]) -> Vec<bool> {
    placed
        .iter()
        .map(|student| {
            student.is_student_response &&
                placed
                    .iter()
                    .any(|ai| !ai.is_student_response && distance(student.position, ai.position) <= ai.radius)
        })
        .collect()
}

/// Places `points` on the plot and categorizes each one.
pub fn flag_points(
    points: &[ProjectedPoint],
    area: &PlotArea,
    config: &ProximityConfig
) -> Vec<FlaggedPoint> {
    let scale = ScreenScale::fit(points, area);
    let placed: Vec<ScreenPoint> = points
        .iter()
        .map(|p| ScreenPoint {
            is_student_response: p.is_student_response,
            position: scale.apply(p),
            radius: config.radius_for(p),
        })
        .collect();
    let flags = misconduct_flags(&placed);

    points
        .iter()
        .zip(&placed)
        .zip(flags)
        .map(|((point, screen), flagged)| {
            let (sx, sy) = screen.position;
            let radius = screen.radius;
            let category = match (point.is_student_response, flagged) {
                (true, true) => PointCategory::PossibleMisconduct,
                (true, false) => PointCategory::Student,
                (false, _) => PointCategory::AiGenerated,
            };
            let mut point = point.clone();
            point.buffer_radius = Some(radius);
            FlaggedPoint {
                point,
                screen_x: sx,
                screen_y: sy,
                category,
                color: category.color(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, x: f64, y: f64, student: bool) -> ProjectedPoint {
        ProjectedPoint {
            id: id.to_string(),
            x,
            y,
            content: String::new(),
            is_student_response: student,
            buffer_radius: None,
        }
    }

    fn placed(student: bool, x: f64, y: f64, radius: f64) -> ScreenPoint {
        ScreenPoint { is_student_response: student, position: (x, y), radius }
    }

    #[test]
    fn student_within_radius_is_flagged() {
        let points = [placed(true, 100.0, 100.0, 20.0), placed(false, 105.0, 100.0, 20.0)];
        assert_eq!(misconduct_flags(&points), vec![true, false]);
    }

    #[test]
    fn student_outside_radius_is_not_flagged() {
        let points = [placed(true, 100.0, 100.0, 20.0), placed(false, 130.0, 100.0, 20.0)];
        assert_eq!(misconduct_flags(&points), vec![false, false]);
    }

    #[test]
    fn boundary_distance_counts_as_inside() {
        let points = [placed(true, 0.0, 0.0, 5.0), placed(false, 3.0, 4.0, 5.0)];
        assert_eq!(misconduct_flags(&points), vec![true, false]);
    }

    #[test]
    fn radius_of_the_ai_point_is_used() {
        // The student's own radius never matters.
        let points = [placed(true, 0.0, 0.0, 100.0), placed(false, 50.0, 0.0, 20.0)];
        assert_eq!(misconduct_flags(&points), vec![false, false]);
        let points = [placed(true, 0.0, 0.0, 10.0), placed(false, 50.0, 0.0, 60.0)];
        assert_eq!(misconduct_flags(&points), vec![true, false]);
    }

    #[test]
    fn students_do_not_flag_each_other() {
        let points = [placed(true, 0.0, 0.0, 90.0), placed(true, 0.0, 0.0, 90.0)];
        assert_eq!(misconduct_flags(&points), vec![false, false]);
    }

    #[test]
    fn flags_match_input_length() {
        assert!(misconduct_flags(&[]).is_empty());
        let points = [
            placed(false, 0.0, 0.0, 30.0),
            placed(true, 10.0, 0.0, 90.0),
            placed(true, 200.0, 0.0, 90.0),
            placed(false, 210.0, 0.0, 5.0),
        ];
        assert_eq!(misconduct_flags(&points), vec![false, true, false, false]);
    }

    #[test]
    fn scale_maps_extent_onto_inner_area() {
        let area = PlotArea::default();
        let points = vec![point("a", -1.0, -2.0, false), point("b", 1.0, 2.0, true)];
        let scale = ScreenScale::fit(&points, &area);
        assert_eq!(scale.apply(&points[0]), (0.0, 330.0));
        assert_eq!(scale.apply(&points[1]), (530.0, 0.0));
    }

    #[test]
    fn degenerate_domain_maps_to_midpoint() {
        let scale = LinearScale::from_extent([3.0, 3.0].into_iter(), (0.0, 530.0));
        assert_eq!(scale.apply(3.0), 265.0);
        let empty = LinearScale::from_extent(std::iter::empty(), (0.0, 10.0));
        assert_eq!(empty.apply(1.0), 5.0);
    }

    #[test]
    fn flag_points_categorizes_and_is_idempotent() {
        let points = vec![
            point("ai", 0.0, 0.0, false),
            point("near", 0.01, 0.0, true),
            point("far", 1.0, 1.0, true),
        ];
        let area = PlotArea::default();
        let config = ProximityConfig::new(20.0);
        let first = flag_points(&points, &area, &config);
        let second = flag_points(&points, &area, &config);
        assert_eq!(first, second);

        let categories: Vec<PointCategory> = first.iter().map(|p| p.category).collect();
        assert_eq!(categories, vec![
            PointCategory::AiGenerated,
            PointCategory::PossibleMisconduct,
            PointCategory::Student,
        ]);
        assert_eq!(first[1].color, "#ffd700");
        assert_eq!(first[0].point.buffer_radius, Some(20.0));
    }

    #[test]
    fn per_point_radius_overrides_default() {
        let mut ai = point("ai", 0.0, 0.0, false);
        ai.buffer_radius = Some(150.0);
        let points = vec![ai, point("s", 0.2, 0.0, true), point("edge", 1.0, 1.0, true)];
        let flagged = flag_points(&points, &PlotArea::default(), &ProximityConfig::new(10.0));
        // 0.2 of a 530px wide axis is 106px, inside the 150px override.
        assert_eq!(flagged[1].category, PointCategory::PossibleMisconduct);
        assert_eq!(flagged[2].category, PointCategory::Student);
    }

    #[test]
    fn radius_is_clamped_to_slider_bounds() {
        assert_eq!(clamp_radius(1.0), MIN_BUFFER_RADIUS);
        assert_eq!(clamp_radius(1000.0), MAX_BUFFER_RADIUS);
        assert_eq!(clamp_radius(f64::NAN), DEFAULT_BUFFER_RADIUS);
        assert_eq!(ProximityConfig::default().default_radius, 90.0);
    }
}
