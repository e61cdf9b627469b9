pub mod pca;
pub mod proximity;

use log::info;
use thiserror::Error;

use crate::models::chat::Conversation;
use crate::models::review::{ ProjectedPoint, Projection };

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("No valid embeddings found")]
    NoValidEmbeddings,
}

/// Keeps the conversations whose embedding is non-empty and has the same
/// length as the first non-empty embedding, in input order.
pub fn valid_embeddings(conversations: &[Conversation]) -> Vec<&Conversation> {
    let mut expected_len = None;
    conversations
        .iter()
        .filter(|c| !c.embedding.is_empty())
        .filter(|c| *expected_len.get_or_insert(c.embedding.len()) == c.embedding.len())
        .collect()
}

fn to_point(conversation: &Conversation, x: f64, y: f64, buffer_radius: f64) -> ProjectedPoint {
    ProjectedPoint {
        id: conversation.id.clone(),
        x,
        y,
        content: conversation.preview().to_string(),
        is_student_response: conversation.is_student_response,
        buffer_radius: Some(buffer_radius),
    }
}

/// Reduces stored embeddings to plot coordinates.
///
/// With two or more valid vectors the result is a PCA projection
/// (`is_pca = true`). A single valid vector is passed through using its first
/// two components. No valid vector at all is an error.
pub fn project(
    conversations: &[Conversation],
    buffer_radius: f64
) -> Result<Projection, ProjectionError> {
    let with_embedding = conversations.iter().filter(|c| !c.embedding.is_empty()).count();
    info!("Conversations with embeddings: {}", with_embedding);
    if with_embedding == 0 {
        return Err(ProjectionError::NoValidEmbeddings);
    }

    let valid = valid_embeddings(conversations);
    info!("Embeddings with consistent length: {}", valid.len());

    let projection = if valid.len() >= 2 {
        let rows: Vec<Vec<f32>> = valid.iter().map(|c| c.embedding.clone()).collect();
        let points = pca::project_2d(&rows)
            .into_iter()
            .zip(&valid)
            .map(|((x, y), conv)| to_point(conv, x, y, buffer_radius))
            .collect();
        Projection { points, is_pca: true }
    } else {
        let points = valid
            .iter()
            .map(|conv| {
                let x = conv.embedding.first().copied().unwrap_or(0.0) as f64;
                let y = conv.embedding.get(1).copied().unwrap_or(0.0) as f64;
                to_point(conv, x, y, buffer_radius)
            })
            .collect();
        Projection { points, is_pca: false }
    };

    info!("Final plot data points: {}", projection.points.len());
    Ok(projection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatMessage;
    use chrono::Utc;

    fn conv(id: &str, embedding: Vec<f32>, student: bool) -> Conversation {
        Conversation {
            id: id.to_string(),
            messages: vec![ChatMessage::user(format!("first message of {}", id))],
            timestamp: Utc::now(),
            embedding,
            is_student_response: student,
            evaluation: None,
        }
    }

    #[test]
    fn three_unit_vectors_take_pca_path() {
        let convs = vec![
            conv("a", vec![1.0, 0.0, 0.0], true),
            conv("b", vec![0.0, 1.0, 0.0], false),
            conv("c", vec![0.0, 0.0, 1.0], true),
        ];
        let projection = project(&convs, 90.0).unwrap();
        assert!(projection.is_pca);
        let ids: Vec<&str> = projection.points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(projection.points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        assert_eq!(projection.points[0].content, "first message of a");
        assert!(!projection.points[1].is_student_response);
        assert_eq!(projection.points[2].buffer_radius, Some(90.0));
    }

    #[test]
    fn single_vector_falls_back_to_raw_components() {
        let projection = project(&[conv("only", vec![1.0, 2.0], true)], 20.0).unwrap();
        assert!(!projection.is_pca);
        assert_eq!(projection.points.len(), 1);
        assert_eq!((projection.points[0].x, projection.points[0].y), (1.0, 2.0));
    }

    #[test]
    fn short_single_vector_is_zero_padded() {
        let projection = project(&[conv("only", vec![4.0], false)], 20.0).unwrap();
        assert_eq!((projection.points[0].x, projection.points[0].y), (4.0, 0.0));
    }

    #[test]
    fn no_embeddings_is_an_error() {
        assert_eq!(project(&[], 90.0), Err(ProjectionError::NoValidEmbeddings));
        let pending = vec![conv("a", Vec::new(), true), conv("b", Vec::new(), false)];
        assert_eq!(project(&pending, 90.0), Err(ProjectionError::NoValidEmbeddings));
    }

    #[test]
    fn inconsistent_lengths_are_dropped() {
        let convs = vec![
            conv("pending", Vec::new(), true),
            conv("a", vec![0.1, 0.2, 0.3], true),
            conv("odd", vec![0.1, 0.2], false),
            conv("b", vec![0.3, 0.2, 0.1], false),
            conv("c", vec![0.5, 0.5, 0.5], true),
        ];
        let valid: Vec<&str> = valid_embeddings(&convs).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(valid, vec!["a", "b", "c"]);

        let projection = project(&convs, 90.0).unwrap();
        assert!(projection.is_pca);
        let ids: Vec<&str> = projection.points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn odd_length_leaves_single_vector_fallback() {
        let convs = vec![conv("a", vec![3.0, 4.0, 5.0], true), conv("b", vec![1.0], false)];
        let projection = project(&convs, 90.0).unwrap();
        assert!(!projection.is_pca);
        assert_eq!(projection.points.len(), 1);
        assert_eq!((projection.points[0].x, projection.points[0].y), (3.0, 4.0));
    }
}
