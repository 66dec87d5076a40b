//! Google Docs: create a document with a plain-text body

use serde::Deserialize;
use serde_json::json;

use super::{check_response, http_client, GoogleAuth, GoogleError};

const DOCS_URL: &str = "https://docs.googleapis.com/v1/documents";

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedDoc {
    pub document_id: String,
    pub url: String,
}

impl CreatedDoc {
    pub fn from_id(document_id: impl Into<String>) -> Self {
        let document_id = document_id.into();
        let url = format!("https://docs.google.com/document/d/{}/edit", document_id);
        Self { document_id, url }
    }
}

pub trait DocsApi {
    fn create_document(&self, title: &str, body: &str) -> Result<CreatedDoc, GoogleError>;
}

pub struct HttpDocs {
    client: reqwest::blocking::Client,
    token: String,
}

impl HttpDocs {
    pub fn connect(auth: &GoogleAuth) -> Result<Self, GoogleError> {
        let client = http_client()?;
        let token = auth.access_token(&client)?;
        Ok(Self { client, token })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentResponse {
    document_id: String,
}

impl DocsApi for HttpDocs {
    fn create_document(&self, title: &str, body: &str) -> Result<CreatedDoc, GoogleError> {
        tracing::info!(title, "creating document");
        let resp = self
            .client
            .post(DOCS_URL)
            .bearer_auth(&self.token)
            .json(&json!({ "title": title }))
            .send()?;
        let doc: DocumentResponse = check_response(resp)?
            .json()
            .map_err(|e| GoogleError::Decode(e.to_string()))?;

        if !body.is_empty() {
            let resp = self
                .client
                .post(format!("{}/{}:batchUpdate", DOCS_URL, doc.document_id))
                .bearer_auth(&self.token)
                .json(&json!({
                    "requests": [
                        { "insertText": { "location": { "index": 1 }, "text": body } }
                    ]
                }))
                .send()?;
            check_response(resp)?;
        }

        Ok(CreatedDoc::from_id(doc.document_id))
    }
}
