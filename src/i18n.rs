//! Translation tables.
//!
//! Every user-visible string the views produce lives here, keyed by
//! [`Language`]. Views hold a `&'static Strings` and never format text
//! inline, so switching language is a pointer swap.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Display language. Chinese is the product default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Cn,
    En,
}

impl Language {
    pub fn strings(self) -> &'static Strings {
        match self {
            Language::Cn => &CN,
            Language::En => &EN,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Language::Cn => Language::En,
            Language::En => Language::Cn,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Cn => f.write_str("cn"),
            Language::En => f.write_str("en"),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cn" | "zh" => Ok(Language::Cn),
            "en" => Ok(Language::En),
            other => Err(format!("unknown language '{}': use cn or en", other)),
        }
    }
}

/// One language's string table.
#[derive(Debug)]
pub struct Strings {
    pub chat_placeholder: &'static str,
    pub thinking: &'static str,
    pub knowledge_map: &'static str,
    pub documents_heading: &'static str,
    pub no_documents: &'static str,
    pub offline_notice: &'static str,
    pub file_unit_one: &'static str,
    pub file_unit_many: &'static str,

    pub upload_failed: &'static str,
    pub unsupported_file_type: &'static str,
    pub file_too_large: &'static str,
    pub load_documents_failed: &'static str,
    pub delete_failed: &'static str,
    pub load_map_failed: &'static str,
    pub switch_failed: &'static str,
    pub extract_failed: &'static str,
    pub ocr_failed: &'static str,
    pub unsupported_image_type: &'static str,

    pub no_answer: &'static str,
    pub service_unavailable: &'static str,
    pub error_prefix: &'static str,
    pub error_source: &'static str,
    pub source_document: &'static str,
    pub source_provider_prefix: &'static str,
    pub source_provider_suffix: &'static str,

    pub greeting: &'static str,
}

impl Strings {
    /// Provenance line for an assistant reply.
    pub fn answer_source(&self, provider: Option<&str>) -> String {
        match provider {
            Some(p) if !p.is_empty() => format!(
                "{}{}{}",
                self.source_provider_prefix, p, self.source_provider_suffix
            ),
            _ => self.source_document.to_string(),
        }
    }

    /// Inline error reply body for a failed question.
    pub fn answer_error(&self, detail: &str) -> String {
        format!("{}{}", self.error_prefix, detail)
    }

    /// Count line under the documents heading.
    pub fn file_count(&self, n: usize) -> String {
        let unit = if n == 1 {
            self.file_unit_one
        } else {
            self.file_unit_many
        };
        format!("({} {})", n, unit)
    }
}

static CN: Strings = Strings {
    chat_placeholder: "输入你的问题，Enter 发送，/image 路径 附加图片，/quit 退出",
    thinking: "思考中...",
    knowledge_map: "知识地图",
    documents_heading: "已上传的资料",
    no_documents: "暂无文档",
    offline_notice: "离线模式：当前显示的是示例数据",
    file_unit_one: "个文件",
    file_unit_many: "个文件",

    upload_failed: "上传失败",
    unsupported_file_type: "不支持的文件类型",
    file_too_large: "文件过大",
    load_documents_failed: "加载文档失败",
    delete_failed: "删除失败",
    load_map_failed: "加载知识地图失败",
    switch_failed: "切换失败",
    extract_failed: "知识提取失败",
    ocr_failed: "图片识别失败",
    unsupported_image_type: "仅支持图片文件",

    no_answer: "抱歉，我无法回答这个问题。",
    service_unavailable: "服务暂时不可用",
    error_prefix: "抱歉，发生了错误：",
    error_source: "Error",
    source_document: "基于文档回答",
    source_provider_prefix: "基于 ",
    source_provider_suffix: " 回答",

    greeting: "你好！我已经学习了你上传的资料。\n\n你可以问我：\n• \"什么是函数的定义域？\"\n• \"帮我总结单调性的判定方法\"\n• \"上传一道题目帮我解析\"",
};

static EN: Strings = Strings {
    chat_placeholder: "Type your question, Enter to send, /image PATH to attach, /quit to exit",
    thinking: "Thinking...",
    knowledge_map: "Knowledge Map",
    documents_heading: "Uploaded materials",
    no_documents: "No documents yet",
    offline_notice: "Offline mode: showing sample data",
    file_unit_one: "file",
    file_unit_many: "files",

    upload_failed: "Upload failed",
    unsupported_file_type: "Unsupported file type",
    file_too_large: "File too large",
    load_documents_failed: "Failed to load documents",
    delete_failed: "Delete failed",
    load_map_failed: "Failed to load knowledge map",
    switch_failed: "Switch failed",
    extract_failed: "Knowledge extraction failed",
    ocr_failed: "Image recognition failed",
    unsupported_image_type: "Only image files are supported",

    no_answer: "Sorry, I can't answer this question.",
    service_unavailable: "Service temporarily unavailable",
    error_prefix: "Sorry, an error occurred: ",
    error_source: "Error",
    source_document: "Based on the document",
    source_provider_prefix: "Based on ",
    source_provider_suffix: "",

    greeting: "Hello! I have studied the material you uploaded.\n\nYou can ask me:\n• \"What is the domain of a function?\"\n• \"Help me summarize the methods for determining monotonicity\"\n• \"Upload a problem for me to analyze\"",
};
