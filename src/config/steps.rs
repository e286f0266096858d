use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;
use zombie_action::PostAction;

/// One step of a script.
#[derive(Debug, Clone)]
pub enum Step {
    /// Load a page, optionally waiting or validating afterwards.
    Open(OpenStep),
    /// Evaluate JavaScript in the current page.
    Execute(ExecuteStep),
    /// Re-read the current page.
    Inspect,
    /// Save an image of the current page.
    Snap(SnapStep),
    /// Log the current page content.
    Dump,
    /// Clear cookies and site storage.
    ClearCache,
    Wait(WaitStep),
    Log(LogStep),
    /// Fail unless the current page contains a text.
    AssertText(AssertTextStep),
}

impl Step {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open(_) => "open",
            Self::Execute(_) => "execute",
            Self::Inspect => "inspect",
            Self::Snap(_) => "snap",
            Self::Dump => "dump",
            Self::ClearCache => "clear_cache",
            Self::Wait(_) => "wait",
            Self::Log(_) => "log",
            Self::AssertText(_) => "assert_text",
        }
    }
}

const STEP_NAMES: &[&str] = &[
    "open",
    "execute",
    "inspect",
    "snap",
    "dump",
    "clear_cache",
    "wait",
    "log",
    "assert_text",
];

const UNIT_STEP_NAMES: &[&str] = &["inspect", "dump", "clear_cache"];

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StepVisitor)
    }
}

struct StepVisitor;

impl<'de> Visitor<'de> for StepVisitor {
    type Value = Step;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a step (bare name, or map with a single step key)")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match value {
            "inspect" => Ok(Step::Inspect),
            "dump" => Ok(Step::Dump),
            "clear_cache" => Ok(Step::ClearCache),
            other => Err(de::Error::unknown_variant(other, UNIT_STEP_NAMES)),
        }
    }

    fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let key: String = map
            .next_key()?
            .ok_or_else(|| de::Error::custom("expected step type key"))?;

        let step = match key.as_str() {
            "open" => Step::Open(map.next_value()?),
            "execute" => Step::Execute(map.next_value()?),
            "snap" => Step::Snap(map.next_value()?),
            "wait" => Step::Wait(map.next_value()?),
            "log" => Step::Log(map.next_value()?),
            "assert_text" => Step::AssertText(map.next_value()?),
            "inspect" | "dump" | "clear_cache" => {
                let _: serde_yaml::Value = map.next_value()?;
                match key.as_str() {
                    "inspect" => Step::Inspect,
                    "dump" => Step::Dump,
                    _ => Step::ClearCache,
                }
            }
            other => return Err(de::Error::unknown_variant(other, STEP_NAMES)),
        };

        Ok(step)
    }
}

// --- Step payloads ---

#[derive(Debug, Clone, Deserialize)]
pub struct OpenStep {
    pub url: String,
    /// Seconds to wait after the load.
    pub wait_seconds: Option<f64>,
    /// Script polled until it returns `true`.
    pub validate: Option<String>,
}

impl OpenStep {
    /// Validation wins over waiting; the schema rejects scripts that set both.
    pub fn post_action(&self) -> PostAction {
        match (&self.validate, self.wait_seconds) {
            (Some(script), _) => PostAction::Validate(script.clone()),
            (None, Some(secs)) if secs > 0.0 => Duration::try_from_secs_f64(secs)
                .map(PostAction::Wait)
                .unwrap_or_default(),
            _ => PostAction::None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteStep {
    pub script: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapStep {
    /// Output file; `{timestamp}` is replaced with the capture time.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitStep {
    pub ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogStep {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssertTextStep {
    pub text: String,
}
