use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::photos::repo::Photo;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPhotoRequest {
    pub user_id: Option<Uuid>,
    pub year: Option<i32>,
    pub image_base64: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPhotosQuery {
    pub year: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PhotoEnvelope {
    pub photo: Option<Photo>,
}

#[derive(Debug, Serialize)]
pub struct PhotosEnvelope {
    pub photos: Vec<Photo>,
}

#[derive(Debug, Serialize)]
pub struct SummaryEnvelope {
    pub summary: BTreeMap<i32, i64>,
}
