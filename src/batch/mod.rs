//! Test definitions: raw rows as loaded, and the typed specs the engine runs.

pub mod loader;
pub mod validate;

pub use self::loader::{load_definitions, parse_definitions};
pub use self::validate::{check_host, validate, ValidationError, ValidationErrors};

/// Source used when a definition leaves it blank.
pub const DEFAULT_SOURCE: &str = "localhost";

/// One test row exactly as it came from the input, before validation.
///
/// Every field is optional here; the validator decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestDefinition {
    pub id_number: Option<String>,
    pub test_type: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub count: Option<String>,
    pub size: Option<String>,
    /// 1-based line number in the input file.
    pub line_ref: usize,
}

/// A validated test, ready for command building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSpec {
    pub id_number: u32,
    pub source: String,
    pub destination: String,
    pub kind: TestKind,
    pub line_ref: usize,
}

/// The three test types, each carrying only the parameters it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestKind {
    Latency { count: u32, size: u32 },
    Throughput { size: TransferSize },
    Jitter,
}

impl TestKind {
    pub fn type_name(&self) -> TestType {
        match self {
            TestKind::Latency { .. } => TestType::Latency,
            TestKind::Throughput { .. } => TestType::Throughput,
            TestKind::Jitter => TestType::Jitter,
        }
    }
}

/// Test type without parameters; used for parsing and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestType {
    Latency,
    Throughput,
    Jitter,
}

impl TestType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latency" => Some(TestType::Latency),
            "throughput" => Some(TestType::Throughput),
            "jitter" => Some(TestType::Jitter),
            _ => None,
        }
    }
}

impl std::fmt::Display for TestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestType::Latency => write!(f, "latency"),
            TestType::Throughput => write!(f, "throughput"),
            TestType::Jitter => write!(f, "jitter"),
        }
    }
}

/// Byte count handed to `iperf3 -n`: digits with an optional K/M/G/T suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSize(String);

impl TransferSize {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let digits = s.strip_suffix(['K', 'M', 'G', 'T', 'k', 'm', 'g', 't']).unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if digits.bytes().all(|b| b == b'0') {
            return None;
        }
        Some(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransferSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
