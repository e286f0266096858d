//! Typed views of engine payloads.

use chrono::{DateTime, Utc};
use zombie_action::{ActionError, ActionResult, Response};

/// Something an engine response can be decoded into.
pub trait Page: Sized + Send + 'static {
    fn decode(response: &Response) -> ActionResult<Self>;
}

/// An HTML document as the engine rendered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPage {
    url: Option<String>,
    html: String,
}

impl HtmlPage {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn contains(&self, text: &str) -> bool {
        self.html.contains(text)
    }
}

impl Page for HtmlPage {
    fn decode(response: &Response) -> ActionResult<Self> {
        Ok(Self {
            url: response.url.clone(),
            html: utf8(&response.data)?,
        })
    }
}

/// A JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPage {
    url: Option<String>,
    value: serde_json::Value,
}

impl JsonPage {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn value(&self) -> &serde_json::Value {
        &self.value
    }

    pub fn into_value(self) -> serde_json::Value {
        self.value
    }
}

impl Page for JsonPage {
    fn decode(response: &Response) -> ActionResult<Self> {
        let value = serde_json::from_slice(&response.data)
            .map_err(|e| ActionError::decoding(format!("invalid JSON: {}", e)))?;
        Ok(Self {
            url: response.url.clone(),
            value,
        })
    }
}

/// Script results decode as plain text.
impl Page for String {
    fn decode(response: &Response) -> ActionResult<Self> {
        utf8(&response.data)
    }
}

fn utf8(data: &[u8]) -> ActionResult<String> {
    String::from_utf8(data.to_vec())
        .map_err(|e| ActionError::decoding(format!("payload is not UTF-8: {}", e)))
}

/// Image of a page at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub data: Vec<u8>,
    pub url: Option<String>,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Fill `{timestamp}` in a path template with the capture time.
    pub fn file_name(&self, template: &str) -> String {
        template.replace("{timestamp}", &self.taken_at.timestamp().to_string())
    }
}
