//! Bridge configuration.
//!
//! [`BridgeOptions`] collects everything the executors and the payload
//! builder need to know about a deployment: the outbound timeout, the static
//! API key sent to the webhook, how multimodal content is handled, and
//! whether task detection runs. Built through [`BridgeOptionsBuilder`] so
//! call sites only name what they change.

/// How multimodal image parts are handled while building the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileMode {
    /// Original content is forwarded unmodified, no files are extracted
    #[default]
    Passthrough,
    /// Embeddable images become inline base64 file records in the JSON body
    ExtractJson,
    /// Embeddable images become file records for multipart submission
    ExtractMultipart,
    /// Images are stripped and discarded, never surfaced
    Disabled,
}

impl FileMode {
    /// Parse a mode from its configuration string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "passthrough" => Some(FileMode::Passthrough),
            "extract-json" | "extract_json" => Some(FileMode::ExtractJson),
            "extract-multipart" | "extract_multipart" => Some(FileMode::ExtractMultipart),
            "disabled" => Some(FileMode::Disabled),
            _ => None,
        }
    }

    /// Whether this mode extracts files out of image parts at all
    pub fn extracts_files(&self) -> bool {
        matches!(
            self,
            FileMode::ExtractJson | FileMode::ExtractMultipart | FileMode::Disabled
        )
    }
}

/// Options for configuring the bridge
#[derive(Clone)]
pub struct BridgeOptions {
    /// Outbound call timeout in milliseconds
    pub timeout_ms: u64,

    /// Static API key sent as a bearer header to the webhook, if any
    pub api_key: Option<String>,

    /// Active multimodal handling mode
    pub file_mode: FileMode,

    /// Whether task detectors run during payload construction
    pub task_detection: bool,
}

impl std::fmt::Debug for BridgeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeOptions")
            .field("timeout_ms", &self.timeout_ms)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("file_mode", &self.file_mode)
            .field("task_detection", &self.task_detection)
            .finish()
    }
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 300_000,
            api_key: None,
            file_mode: FileMode::default(),
            task_detection: true,
        }
    }
}

impl BridgeOptions {
    /// Create a new builder for BridgeOptions
    pub fn builder() -> BridgeOptionsBuilder {
        BridgeOptionsBuilder::default()
    }
}

/// Builder for BridgeOptions
#[derive(Debug, Default)]
pub struct BridgeOptionsBuilder {
    timeout_ms: Option<u64>,
    api_key: Option<String>,
    file_mode: Option<FileMode>,
    task_detection: Option<bool>,
}

impl BridgeOptionsBuilder {
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn file_mode(mut self, mode: FileMode) -> Self {
        self.file_mode = Some(mode);
        self
    }

    pub fn task_detection(mut self, enabled: bool) -> Self {
        self.task_detection = Some(enabled);
        self
    }

    pub fn build(self) -> BridgeOptions {
        BridgeOptions {
            timeout_ms: self.timeout_ms.unwrap_or(300_000),
            api_key: self.api_key,
            file_mode: self.file_mode.unwrap_or_default(),
            task_detection: self.task_detection.unwrap_or(true),
        }
    }
}
