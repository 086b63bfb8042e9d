//! Remote configuration body as served by the coordinator.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use super::offset::parse_clock_offset;
use super::types::{ExperienceDescriptor, OverlayDescriptor, Position};

/// Errors turning a configuration body into a descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("malformed configuration body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("configuration body has no primary media (videoPrincipal)")]
    MissingPrimaryMedia,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigurationBody {
    #[serde(default)]
    video_principal: Option<String>,
    /// Kept as raw values so one bad entry only costs that overlay.
    #[serde(default)]
    hologramas: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HologramBody {
    video: String,
    marcador: String,
    inicio: String,
    duracion: String,
    ancho: f32,
    alto: f32,
    pos_x: f32,
    pos_y: f32,
    pos_z: f32,
}

impl HologramBody {
    fn into_descriptor(self, index: usize) -> Option<OverlayDescriptor> {
        if self.video.trim().is_empty() || self.marcador.trim().is_empty() {
            warn!(index, "Skipping overlay without media or marker");
            return None;
        }

        let offsets = parse_clock_offset(&self.inicio)
            .and_then(|start| parse_clock_offset(&self.duracion).map(|d| (start, d)));
        let (start_offset_secs, duration_secs) = match offsets {
            Ok(offsets) => offsets,
            Err(e) => {
                warn!(index, marker = %self.marcador, error = %e, "Skipping overlay with invalid window");
                return None;
            }
        };

        Some(OverlayDescriptor {
            media_ref: self.video,
            marker_id: self.marcador,
            start_offset_secs,
            duration_secs,
            width: self.ancho,
            height: self.alto,
            position: Position {
                x: self.pos_x,
                y: self.pos_y,
                z: self.pos_z,
            },
        })
    }
}

/// Parse the `getConfiguration` body.
///
/// A malformed body or one without primary media fails as a whole.
/// Individual overlays that cannot be scheduled are dropped with a warning.
pub fn parse_experience(body: &str) -> Result<ExperienceDescriptor, DescriptorError> {
    let body: ConfigurationBody = serde_json::from_str(body)?;

    let primary_media_ref = body
        .video_principal
        .filter(|v| !v.trim().is_empty())
        .ok_or(DescriptorError::MissingPrimaryMedia)?;

    let overlays = body
        .hologramas
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match serde_json::from_value::<HologramBody>(raw) {
            Ok(hologram) => hologram.into_descriptor(index),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed overlay");
                None
            }
        })
        .collect();

    Ok(ExperienceDescriptor {
        primary_media_ref,
        overlays,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_body() {
        let body = r#"{
            "videoPrincipal": "main.mp4",
            "hologramas": [
                {
                    "video": "holo1.mp4", "marcador": "poster",
                    "inicio": "1:30", "duracion": "0:30",
                    "ancho": 1.5, "alto": 0.75,
                    "pos_x": 0.1, "pos_y": 0.2, "pos_z": -0.3
                },
                {
                    "video": "holo2.mp4", "marcador": "table",
                    "inicio": "2:00", "duracion": "1:00",
                    "ancho": 1, "alto": 1, "pos_x": 0, "pos_y": 0, "pos_z": 0
                }
            ]
        }"#;

        let experience = parse_experience(body).unwrap();
        assert_eq!(experience.primary_media_ref, "main.mp4");
        assert_eq!(experience.overlays.len(), 2);

        let first = &experience.overlays[0];
        assert_eq!(first.media_ref, "holo1.mp4");
        assert_eq!(first.marker_id, "poster");
        assert_eq!(first.start_offset_secs, 90.0);
        assert_eq!(first.duration_secs, 30.0);
        assert_eq!(first.width, 1.5);
        assert_eq!(first.position.z, -0.3);

        assert_eq!(experience.overlays[1].marker_id, "table");
        assert_eq!(experience.overlays[1].window_end(), 180.0);
    }

    #[test]
    fn test_parse_without_overlays() {
        let experience = parse_experience(r#"{"videoPrincipal": "main.mp4"}"#).unwrap();
        assert!(experience.overlays.is_empty());
    }

    #[test]
    fn test_unsplittable_offsets_fall_back_to_zero() {
        let body = r#"{
            "videoPrincipal": "main.mp4",
            "hologramas": [
                {"video": "h.mp4", "marcador": "m", "inicio": "90", "duracion": "0:10"}
            ]
        }"#;
        let experience = parse_experience(body).unwrap();
        assert_eq!(experience.overlays[0].start_offset_secs, 0.0);
        assert_eq!(experience.overlays[0].duration_secs, 10.0);
    }

    #[test]
    fn test_unschedulable_overlays_are_skipped() {
        let body = r#"{
            "videoPrincipal": "main.mp4",
            "hologramas": [
                {"video": "", "marcador": "m", "inicio": "0:10", "duracion": "0:10"},
                {"video": "h.mp4", "marcador": "m", "inicio": "x:10", "duracion": "0:10"},
                {"video": "ok.mp4", "marcador": "m", "inicio": "0:10", "duracion": "0:10"}
            ]
        }"#;
        let experience = parse_experience(body).unwrap();
        assert_eq!(experience.overlays.len(), 1);
        assert_eq!(experience.overlays[0].media_ref, "ok.mp4");
    }

    const VALID_OVERLAY: &str =
        r#"{"video": "ok.mp4", "marcador": "m", "inicio": "0:10", "duracion": "0:10"}"#;

    #[test]
    fn test_null_overlay_entry_is_skipped() {
        let body = format!(
            r#"{{"videoPrincipal": "main.mp4", "hologramas": [null, {}]}}"#,
            VALID_OVERLAY
        );
        let experience = parse_experience(&body).unwrap();
        assert_eq!(experience.overlays.len(), 1);
        assert_eq!(experience.overlays[0].media_ref, "ok.mp4");
    }

    #[test]
    fn test_mistyped_overlay_field_is_skipped() {
        let body = format!(
            r#"{{"videoPrincipal": "main.mp4", "hologramas": [
                {{"video": "bad.mp4", "marcador": "m", "inicio": "0:10", "duracion": "0:10", "ancho": "1.5"}},
                {}
            ]}}"#,
            VALID_OVERLAY
        );
        let experience = parse_experience(&body).unwrap();
        assert_eq!(experience.overlays.len(), 1);
        assert_eq!(experience.overlays[0].media_ref, "ok.mp4");
    }

    #[test]
    fn test_null_overlay_list_is_empty() {
        let experience =
            parse_experience(r#"{"videoPrincipal": "main.mp4", "hologramas": null}"#).unwrap();
        assert!(experience.overlays.is_empty());
    }

    #[test]
    fn test_non_finite_offset_overlay_is_skipped() {
        let body = format!(
            r#"{{"videoPrincipal": "main.mp4", "hologramas": [
                {{"video": "nan.mp4", "marcador": "m", "inicio": "NaN:00", "duracion": "0:10"}},
                {}
            ]}}"#,
            VALID_OVERLAY
        );
        let experience = parse_experience(&body).unwrap();
        assert_eq!(experience.overlays.len(), 1);
        assert!(experience.overlays[0].start_offset_secs.is_finite());
    }

    #[test]
    fn test_missing_primary_media_fails() {
        let result = parse_experience(r#"{"hologramas": []}"#);
        assert!(matches!(result, Err(DescriptorError::MissingPrimaryMedia)));
    }

    #[test]
    fn test_malformed_body_fails() {
        let result = parse_experience("<html>503</html>");
        assert!(matches!(result, Err(DescriptorError::Malformed(_))));
    }
}
