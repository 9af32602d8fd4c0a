use serde::{Deserialize, Serialize};

use crate::survey::{Question, QuestionKind};

const WHATSAPP_MAX_BUTTONS: usize = 3;
const WHATSAPP_BUTTON_CHARS: usize = 20;
const IVR_MAX_OPTIONS: usize = 9;

/// Delivery channel for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Whatsapp,
    Ivr,
    Web,
}

/// Display locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Hi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhatsAppButton {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WhatsAppMessage {
    Text { body: String },
    Interactive { body: String, buttons: Vec<WhatsAppButton> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Female,
    Male,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtmfOption {
    pub digit: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IvrPrompt {
    pub voice: Voice,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtmf_options: Option<Vec<DtmfOption>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WebFieldType {
    Textarea,
    Select,
    CheckboxGroup,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebFormField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: WebFieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub required: bool,
}

/// A question rendered for one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChannelPayload {
    Whatsapp(Vec<WhatsAppMessage>),
    Ivr(IvrPrompt),
    Web(WebFormField),
}

fn localized_title(q: &Question, locale: Locale) -> String {
    match (locale, &q.hi_title) {
        (Locale::Hi, Some(hi)) => hi.clone(),
        _ => q.title.clone(),
    }
}

/// Single-choice options, the only kind rendered as buttons or keypad choices.
fn single_choice_options(q: &Question) -> Option<&[String]> {
    match &q.kind {
        QuestionKind::Radio { options } | QuestionKind::MultipleChoice { options } => Some(options),
        _ => None,
    }
}

pub fn to_whatsapp_messages(q: &Question, locale: Locale) -> Vec<WhatsAppMessage> {
    let body = localized_title(q, locale);
    match single_choice_options(q) {
        Some(options) => {
            let buttons = options
                .iter()
                .take(WHATSAPP_MAX_BUTTONS)
                .enumerate()
                .map(|(i, o)| WhatsAppButton {
                    id: format!("{}_{}", q.id, i),
                    title: o.chars().take(WHATSAPP_BUTTON_CHARS).collect(),
                })
                .collect();
            vec![WhatsAppMessage::Interactive { body, buttons }]
        }
        None => vec![WhatsAppMessage::Text { body }],
    }
}

pub fn to_ivr_prompt(q: &Question, locale: Locale) -> IvrPrompt {
    let dtmf_options = single_choice_options(q).map(|options| {
        options
            .iter()
            .take(IVR_MAX_OPTIONS)
            .enumerate()
            .map(|(i, o)| DtmfOption {
                digit: (i + 1).to_string(),
                value: o.clone(),
            })
            .collect()
    });
    IvrPrompt {
        voice: Voice::Female,
        text: localized_title(q, locale),
        dtmf_options,
    }
}

pub fn to_web_form_field(q: &Question, locale: Locale) -> WebFormField {
    let (field_type, options) = match &q.kind {
        QuestionKind::Text => (WebFieldType::Textarea, None),
        QuestionKind::Checkbox { options } => (WebFieldType::CheckboxGroup, Some(options.clone())),
        QuestionKind::Radio { options } | QuestionKind::MultipleChoice { options } => {
            (WebFieldType::Select, Some(options.clone()))
        }
    };
    WebFormField {
        id: q.id.clone(),
        label: localized_title(q, locale),
        field_type,
        options,
        required: q.required,
    }
}

/// Render `q` for `channel`.
pub fn transform_for_channel(q: &Question, channel: Channel, locale: Locale) -> ChannelPayload {
    match channel {
        Channel::Whatsapp => ChannelPayload::Whatsapp(to_whatsapp_messages(q, locale)),
        Channel::Ivr => ChannelPayload::Ivr(to_ivr_prompt(q, locale)),
        Channel::Web => ChannelPayload::Web(to_web_form_field(q, locale)),
    }
}
