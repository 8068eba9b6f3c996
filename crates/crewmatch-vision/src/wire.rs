//! Request and response bodies, in the service's PascalCase JSON shape.

use serde::{Deserialize, Serialize};

use crewmatch_core::{FaceDetail, Gender};

/// Inline image payload: base64-encoded file bytes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImageBlob {
    pub bytes: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetectFacesRequest {
    pub image: ImageBlob,
    pub attributes: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecognizeCelebritiesRequest {
    pub image: ImageBlob,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompareFacesRequest {
    pub source_image: ImageBlob,
    pub target_image: ImageBlob,
    pub similarity_threshold: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetectFacesResponse {
    #[serde(default)]
    pub face_details: Vec<FaceDetailWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaceDetailWire {
    pub gender: Option<GenderWire>,
    pub pose: Option<PoseWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenderWire {
    pub value: String,
    pub confidence: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PoseWire {
    pub roll: f32,
    pub yaw: f32,
    pub pitch: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RecognizeCelebritiesResponse {
    #[serde(default)]
    pub celebrity_faces: Vec<CelebrityWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CelebrityWire {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompareFacesResponse {
    #[serde(default)]
    pub face_matches: Vec<FaceMatchWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaceMatchWire {
    pub similarity: f32,
}

impl From<FaceDetailWire> for FaceDetail {
    fn from(wire: FaceDetailWire) -> Self {
        let (gender, gender_confidence) = match wire.gender {
            Some(g) => (Gender::parse(&g.value), g.confidence),
            None => (Gender::Unknown, 0.0),
        };
        let pose = wire.pose.unwrap_or_default();
        FaceDetail {
            gender,
            gender_confidence,
            roll: pose.roll,
            yaw: pose.yaw,
            pitch: pose.pitch,
        }
    }
}
