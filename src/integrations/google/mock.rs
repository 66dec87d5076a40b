//! In-memory Google implementation for tests and offline use

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::docs::{CreatedDoc, DocsApi};
use super::gmail::{EmailMessage, GmailApi, SentMessage};
use super::sheets::{CreatedSpreadsheet, SheetsApi};
use super::GoogleError;

#[derive(Debug, Default)]
struct State {
    sheets: HashMap<(String, String), Vec<Vec<String>>>,
    sent: Vec<EmailMessage>,
    docs: Vec<(String, String)>,
    next_id: u32,
    fail_with: Option<String>,
}

/// Captures every call; reads return what was written or seeded
#[derive(Debug, Clone, Default)]
pub struct MockGoogle {
    state: Arc<Mutex<State>>,
}

impl MockGoogle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every subsequent call fails with an API error
    pub fn failing(message: &str) -> Self {
        let mock = Self::new();
        mock.with_state(|s| s.fail_with = Some(message.to_string()));
        mock
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut guard = match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    fn check(&self) -> Result<u32, GoogleError> {
        self.with_state(|s| match &s.fail_with {
            Some(message) => Err(GoogleError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => {
                s.next_id += 1;
                Ok(s.next_id)
            }
        })
    }

    pub fn put_sheet(&self, spreadsheet_id: &str, range: &str, values: Vec<Vec<String>>) {
        self.with_state(|s| {
            s.sheets
                .insert((spreadsheet_id.to_string(), range.to_string()), values)
        });
    }

    pub fn sheet(&self, spreadsheet_id: &str, range: &str) -> Option<Vec<Vec<String>>> {
        self.with_state(|s| {
            s.sheets
                .get(&(spreadsheet_id.to_string(), range.to_string()))
                .cloned()
        })
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.with_state(|s| s.sent.clone())
    }

    /// (title, body) of every created document
    pub fn documents(&self) -> Vec<(String, String)> {
        self.with_state(|s| s.docs.clone())
    }
}

impl SheetsApi for MockGoogle {
    fn read_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, GoogleError> {
        self.check()?;
        Ok(self.sheet(spreadsheet_id, range).unwrap_or_default())
    }

    fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<usize, GoogleError> {
        self.check()?;
        self.put_sheet(spreadsheet_id, range, values.to_vec());
        Ok(values.iter().map(Vec::len).sum())
    }

    fn create_spreadsheet(&self, _title: &str) -> Result<CreatedSpreadsheet, GoogleError> {
        let n = self.check()?;
        let spreadsheet_id = format!("mock-sheet-{}", n);
        Ok(CreatedSpreadsheet {
            url: format!("https://docs.google.com/spreadsheets/d/{}", spreadsheet_id),
            spreadsheet_id,
        })
    }
}

impl GmailApi for MockGoogle {
    fn send(&self, message: &EmailMessage) -> Result<SentMessage, GoogleError> {
        let n = self.check()?;
        self.with_state(|s| s.sent.push(message.clone()));
        Ok(SentMessage {
            message_id: format!("mock-msg-{}", n),
            thread_id: format!("mock-thread-{}", n),
        })
    }
}

impl DocsApi for MockGoogle {
    fn create_document(&self, title: &str, body: &str) -> Result<CreatedDoc, GoogleError> {
        let n = self.check()?;
        self.with_state(|s| s.docs.push((title.to_string(), body.to_string())));
        Ok(CreatedDoc::from_id(format!("mock-doc-{}", n)))
    }
}
