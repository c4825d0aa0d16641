//! Boundary validation of model-supplied tool arguments.
//!
//! Each tool gets a serde `Args` struct; missing required fields, wrong types
//! and blank references are rejected here as [`ToolError::InvalidArguments`]
//! so nothing downstream sees a half-formed call.

use super::*;
use crate::page::protocol::{PageAction, ScrollDirection, DEFAULT_SCROLL_AMOUNT};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Number, Value};

/// A validated tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    Navigate { url: String },
    Click { reference: String },
    TypeText { reference: String, text: String },
    PressKey { reference: String, key: String },
    Scroll { direction: ScrollDirection, amount: i64 },
    SelectOption { reference: String, value: String },
    Wait { seconds: f64 },
    GetPageState,
    AskUser(AskUserArgs),
    ReportStatus { message: String },
}

/// Arguments of `ask_user`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskUserArgs {
    pub question: String,
    /// Empty when the question is free-form.
    pub options: Vec<String>,
    pub recommended_index: Option<usize>,
}

#[derive(Deserialize)]
struct NavigateArgs {
    url: String,
}

#[derive(Deserialize)]
struct RefArgs {
    #[serde(rename = "ref")]
    reference: String,
}

#[derive(Deserialize)]
struct TypeTextArgs {
    #[serde(rename = "ref")]
    reference: String,
    text: String,
}

#[derive(Deserialize)]
struct PressKeyArgs {
    #[serde(rename = "ref")]
    reference: String,
    key: String,
}

#[derive(Deserialize)]
struct ScrollArgs {
    direction: ScrollDirection,
    #[serde(default)]
    amount: Option<f64>,
}

#[derive(Deserialize)]
struct SelectOptionArgs {
    #[serde(rename = "ref")]
    reference: String,
    value: String,
}

#[derive(Deserialize)]
struct WaitArgs {
    seconds: f64,
}

#[derive(Deserialize)]
struct AskUserRaw {
    question: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    recommended_index: Option<Number>,
}

#[derive(Deserialize)]
struct ReportStatusArgs {
    message: String,
}

impl ToolInput {
    /// Validate `input` for the tool called `name`.
    pub fn parse(name: &str, input: &Value) -> Result<Self, ToolError> {
        // Some providers send `null` for tools without parameters.
        let empty = Value::Object(Default::default());
        let input = if input.is_null() { &empty } else { input };
        if !input.is_object() {
            return Err(ToolError::InvalidArguments(
                "arguments must be a JSON object".into(),
            ));
        }

        match name {
            NAVIGATE => {
                let args: NavigateArgs = args(input)?;
                Ok(Self::Navigate {
                    url: absolute_http_url(&args.url)?,
                })
            }
            CLICK => {
                let args: RefArgs = args(input)?;
                Ok(Self::Click {
                    reference: non_blank("ref", args.reference)?,
                })
            }
            TYPE_TEXT => {
                let args: TypeTextArgs = args(input)?;
                Ok(Self::TypeText {
                    reference: non_blank("ref", args.reference)?,
                    text: args.text,
                })
            }
            PRESS_KEY => {
                let args: PressKeyArgs = args(input)?;
                Ok(Self::PressKey {
                    reference: non_blank("ref", args.reference)?,
                    key: non_blank("key", args.key)?,
                })
            }
            SCROLL => {
                let args: ScrollArgs = args(input)?;
                let amount = match args.amount {
                    None => DEFAULT_SCROLL_AMOUNT,
                    Some(amount) if amount.is_finite() && amount >= 0.0 => amount.round() as i64,
                    Some(amount) => {
                        return Err(ToolError::InvalidArguments(format!(
                            "amount must be a non-negative number of pixels, got {amount}"
                        )))
                    }
                };
                Ok(Self::Scroll {
                    direction: args.direction,
                    amount,
                })
            }
            SELECT_OPTION => {
                let args: SelectOptionArgs = args(input)?;
                Ok(Self::SelectOption {
                    reference: non_blank("ref", args.reference)?,
                    value: args.value,
                })
            }
            WAIT => {
                let args: WaitArgs = args(input)?;
                if !args.seconds.is_finite() {
                    return Err(ToolError::InvalidArguments("seconds must be finite".into()));
                }
                Ok(Self::Wait {
                    seconds: args.seconds,
                })
            }
            GET_PAGE_STATE => Ok(Self::GetPageState),
            ASK_USER => {
                let raw: AskUserRaw = args(input)?;
                let recommended_index = raw
                    .recommended_index
                    .as_ref()
                    .map(non_negative_index)
                    .transpose()?;
                Ok(Self::AskUser(AskUserArgs {
                    question: non_blank("question", raw.question)?,
                    options: raw.options.unwrap_or_default(),
                    recommended_index,
                }))
            }
            REPORT_STATUS => {
                let args: ReportStatusArgs = args(input)?;
                Ok(Self::ReportStatus {
                    message: args.message,
                })
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Navigate { .. } => NAVIGATE,
            Self::Click { .. } => CLICK,
            Self::TypeText { .. } => TYPE_TEXT,
            Self::PressKey { .. } => PRESS_KEY,
            Self::Scroll { .. } => SCROLL,
            Self::SelectOption { .. } => SELECT_OPTION,
            Self::Wait { .. } => WAIT,
            Self::GetPageState => GET_PAGE_STATE,
            Self::AskUser(_) => ASK_USER,
            Self::ReportStatus { .. } => REPORT_STATUS,
        }
    }

    /// The page-process action for tools the page executes itself.
    pub fn page_action(&self) -> Option<PageAction> {
        match self {
            Self::Click { reference } => Some(PageAction::Click {
                reference: reference.clone(),
            }),
            Self::TypeText { reference, text } => Some(PageAction::TypeText {
                reference: reference.clone(),
                text: text.clone(),
            }),
            Self::PressKey { reference, key } => Some(PageAction::PressKey {
                reference: reference.clone(),
                key: key.clone(),
            }),
            Self::Scroll { direction, amount } => Some(PageAction::Scroll {
                direction: *direction,
                amount: Some(*amount),
            }),
            Self::SelectOption { reference, value } => Some(PageAction::SelectOption {
                reference: reference.clone(),
                value: value.clone(),
            }),
            Self::Wait { seconds } => Some(PageAction::Wait { seconds: *seconds }),
            Self::Navigate { .. } | Self::GetPageState | Self::AskUser(_) | Self::ReportStatus { .. } => {
                None
            }
        }
    }

    /// Short progress detail shown next to the tool name.
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Navigate { url } => Some(url.clone()),
            Self::Click { reference }
            | Self::TypeText { reference, .. }
            | Self::SelectOption { reference, .. } => Some(reference.clone()),
            Self::PressKey { key, .. } => Some(key.clone()),
            Self::Scroll { direction, .. } => Some(direction.to_string()),
            Self::Wait { seconds } => Some(format!("{seconds}s")),
            Self::GetPageState | Self::AskUser(_) | Self::ReportStatus { .. } => None,
        }
    }
}

fn args<T: DeserializeOwned>(input: &Value) -> Result<T, ToolError> {
    serde_json::from_value(input.clone()).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn non_blank(field: &str, value: String) -> Result<String, ToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ToolError::InvalidArguments(format!("`{field}` must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn absolute_http_url(raw: &str) -> Result<String, ToolError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ToolError::InvalidArguments(format!("invalid url `{raw}`: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.into()),
        scheme => Err(ToolError::InvalidArguments(format!(
            "url must use http or https, got `{scheme}`"
        ))),
    }
}

fn non_negative_index(number: &Number) -> Result<usize, ToolError> {
    let invalid = || {
        ToolError::InvalidArguments(format!(
            "recommended_index must be a non-negative integer, got {number}"
        ))
    };
    if let Some(index) = number.as_u64() {
        return usize::try_from(index).map_err(|_| invalid());
    }
    match number.as_f64() {
        Some(value) if value >= 0.0 && value.fract() == 0.0 && value <= usize::MAX as f64 => {
            Ok(value as usize)
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invalid(name: &str, input: Value) -> String {
        match ToolInput::parse(name, &input) {
            Err(ToolError::InvalidArguments(msg)) => msg,
            other => panic!("expected invalid arguments, got {other:?}"),
        }
    }

    #[test]
    fn click_requires_ref() {
        assert!(invalid(CLICK, json!({})).contains("ref"));
        assert!(invalid(CLICK, json!({"ref": "  "})).contains("must not be empty"));
        assert_eq!(
            ToolInput::parse(CLICK, &json!({"ref": "@e4"})).unwrap(),
            ToolInput::Click {
                reference: "@e4".into()
            }
        );
    }

    #[test]
    fn type_text_accepts_empty_text_but_not_missing_text() {
        assert!(invalid(TYPE_TEXT, json!({"ref": "@e1"})).contains("text"));
        let parsed = ToolInput::parse(TYPE_TEXT, &json!({"ref": "@e1", "text": ""})).unwrap();
        assert_eq!(parsed.page_action().unwrap().name(), "type_text");
    }

    #[test]
    fn press_key_has_no_default_key() {
        assert!(invalid(PRESS_KEY, json!({"ref": "@e1"})).contains("key"));
    }

    #[test]
    fn scroll_defaults_amount_and_validates_direction() {
        assert_eq!(
            ToolInput::parse(SCROLL, &json!({"direction": "down"})).unwrap(),
            ToolInput::Scroll {
                direction: ScrollDirection::Down,
                amount: 300
            }
        );
        assert!(invalid(SCROLL, json!({"direction": "left"})).contains("unknown variant"));
        assert!(invalid(SCROLL, json!({})).contains("direction"));
        assert!(invalid(SCROLL, json!({"direction": "up", "amount": -5})).contains("non-negative"));
    }

    #[test]
    fn navigate_requires_absolute_http_url() {
        assert_eq!(
            ToolInput::parse(NAVIGATE, &json!({"url": "https://shop.test"})).unwrap(),
            ToolInput::Navigate {
                url: "https://shop.test/".into()
            }
        );
        assert!(invalid(NAVIGATE, json!({"url": "/cart"})).contains("invalid url"));
        assert!(invalid(NAVIGATE, json!({"url": "file:///etc/passwd"})).contains("http or https"));
    }

    #[test]
    fn ask_user_options_and_recommendation() {
        let parsed = ToolInput::parse(
            ASK_USER,
            &json!({"question": "Which one?", "options": ["A", "B"], "recommended_index": 1.0}),
        )
        .unwrap();
        assert_eq!(
            parsed,
            ToolInput::AskUser(AskUserArgs {
                question: "Which one?".into(),
                options: vec!["A".into(), "B".into()],
                recommended_index: Some(1),
            })
        );
        assert!(invalid(ASK_USER, json!({"question": "?", "recommended_index": -1}))
            .contains("non-negative integer"));
        assert!(invalid(ASK_USER, json!({"question": "?", "recommended_index": 0.5}))
            .contains("non-negative integer"));
        assert!(invalid(ASK_USER, json!({"options": ["A"]})).contains("question"));
    }

    #[test]
    fn get_page_state_accepts_null_input() {
        assert_eq!(
            ToolInput::parse(GET_PAGE_STATE, &Value::Null).unwrap(),
            ToolInput::GetPageState
        );
        assert!(invalid(GET_PAGE_STATE, json!([1, 2])).contains("JSON object"));
    }

    #[test]
    fn details_describe_the_target() {
        let wait = ToolInput::parse(WAIT, &json!({"seconds": 2})).unwrap();
        assert_eq!(wait.detail().as_deref(), Some("2s"));
        let key = ToolInput::parse(PRESS_KEY, &json!({"ref": "@e2", "key": "Enter"})).unwrap();
        assert_eq!(key.detail().as_deref(), Some("Enter"));
        assert_eq!(ToolInput::GetPageState.detail(), None);
        assert!(ToolInput::GetPageState.page_action().is_none());
    }
}
