use serde::{Deserialize, Serialize};

use super::fund::FundRecord;

/// Text shown when the narrative request fails for any reason.
pub const NARRATIVE_FALLBACK: &str = "获取 AI 建议失败，请检查网络连接。";

const MARKET_PROMPT: &str =
    "分析当前宏观经济背景下，对于场外基金（股票型、指数型、债券型）的投资建议，并预测未来一个月的市场情绪。请以精炼的 Markdown 格式返回。";

/// What the user asked commentary for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NarrativePrompt {
    /// General market commentary.
    Market,
    /// Commentary on one fund.
    Fund {
        name: String,
        code: String,
        sector: String,
    },
}

impl NarrativePrompt {
    pub fn for_fund(fund: &FundRecord) -> Self {
        NarrativePrompt::Fund {
            name: fund.name.clone(),
            code: fund.code.clone(),
            sector: fund.sector_or_category().to_string(),
        }
    }

    /// Natural-language prompt sent to the model.
    pub fn to_text(&self) -> String {
        match self {
            NarrativePrompt::Market => MARKET_PROMPT.to_string(),
            NarrativePrompt::Fund { name, code, sector } => format!(
                "请作为专业基金分析师，简要点评基金「{name}」（代码 {code}，所属板块：{sector}）。\
                 内容包括：近期表现与板块景气度、主要风险点、适合的投资者类型与定投建议。\
                 请以精炼的 Markdown 格式返回。"
            ),
        }
    }
}

/// The outbound request handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeRequest {
    pub prompt: String,
    /// Ask the provider to ground the answer in web search results.
    pub grounded: bool,
}

/// Commentary returned to the UI. Opaque pre-formatted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub text: String,
    /// True when `text` is the fixed fallback message.
    pub is_fallback: bool,
}

impl Narrative {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_fallback: false,
        }
    }

    pub fn fallback() -> Self {
        Self {
            text: NARRATIVE_FALLBACK.to_string(),
            is_fallback: true,
        }
    }

    /// One paragraph per line of text.
    pub fn paragraphs(&self) -> Vec<&str> {
        self.text.lines().collect()
    }
}
