use serde::{ Serialize, Deserialize };

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedPoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub content: String,
    pub is_student_response: bool,
    #[serde(default)]
    pub buffer_radius: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Projection {
    pub points: Vec<ProjectedPoint>,
    #[serde(rename = "isPCA")]
    pub is_pca: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointCategory {
    Student,
    AiGenerated,
    PossibleMisconduct,
}

impl PointCategory {
    /// Fill colour used by the review scatter plot.
    pub fn color(&self) -> &'static str {
        match self {
            PointCategory::Student => "#48bb78",
            PointCategory::AiGenerated => "#f56565",
            PointCategory::PossibleMisconduct => "#ffd700",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedPoint {
    #[serde(flatten)]
    pub point: ProjectedPoint,
    pub screen_x: f64,
    pub screen_y: f64,
    pub category: PointCategory,
    pub color: &'static str,
}
