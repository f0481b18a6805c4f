use blobtree_store::StoreError;
use blobtree_types::ObjectId;
use thiserror::Error;

/// Errors produced while encoding or decoding.
///
/// Recursive calls wrap lower errors in [`CodecError::Context`] layers that
/// name the field, index, key or blob being processed, so the rendered
/// message reads like a path from the root down to the failure. Use
/// [`CodecError::root`] to classify an error regardless of wrapping.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A value this engine cannot represent.
    #[error("unsupported type \"{type_name}\": {reason}")]
    UnsupportedType {
        type_name: &'static str,
        reason: &'static str,
    },

    /// A record could not hand out one of the fields its layout declares.
    #[error("record {record} does not expose field {field}")]
    NotWritable {
        record: &'static str,
        field: &'static str,
    },

    /// Text that should have been a number, UTF-8 string, map key, object
    /// reference or JSON document could not be parsed.
    #[error("parsing {what} from {input:?}: {reason}")]
    Parse {
        what: &'static str,
        input: String,
        reason: String,
    },

    /// The stored structure does not have the shape the destination expects.
    #[error("decoding: expected {expected}, found {found}")]
    ShapeMismatch {
        expected: &'static str,
        found: String,
    },

    /// A referenced blob is absent from the store.
    #[error("blob {0} not found")]
    MissingBlob(ObjectId),

    /// The store reported a failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The call context was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The codec configuration could not be loaded.
    #[error("invalid codec configuration: {0}")]
    Config(String),

    /// A lower error annotated with what was in flight when it happened.
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// The innermost error beneath any context layers.
    pub fn root(&self) -> &CodecError {
        let mut err = self;
        while let CodecError::Context { source, .. } = err {
            err = source;
        }
        err
    }

    /// Returns `true` if the root cause is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), CodecError::Cancelled)
    }

    pub(crate) fn parse(what: &'static str, input: &[u8], reason: impl ToString) -> Self {
        CodecError::Parse {
            what,
            input: String::from_utf8_lossy(input).into_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn mismatch(expected: &'static str, found: impl ToString) -> Self {
        CodecError::ShapeMismatch {
            expected,
            found: found.to_string(),
        }
    }
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Adds a context layer to an error result.
pub trait ResultExt<T> {
    /// Wrap the error, if any, with the message produced by `f`.
    fn context<F, C>(self, f: F) -> CodecResult<T>
    where
        F: FnOnce() -> C,
        C: ToString;
}

impl<T> ResultExt<T> for CodecResult<T> {
    fn context<F, C>(self, f: F) -> CodecResult<T>
    where
        F: FnOnce() -> C,
        C: ToString,
    {
        self.map_err(|source| CodecError::Context {
            context: f().to_string(),
            source: Box::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_layers_render_outermost_first() {
        let err: CodecResult<()> = Err(CodecError::Cancelled);
        let err = err
            .context(|| "decoding element 3")
            .context(|| "building sequence for field tags")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "building sequence for field tags: decoding element 3: operation cancelled"
        );
        assert!(err.is_cancelled());
    }

    #[test]
    fn root_of_unwrapped_error_is_itself() {
        let err = CodecError::MissingBlob(ObjectId::null());
        assert!(matches!(err.root(), CodecError::MissingBlob(_)));
    }

    #[test]
    fn parse_error_keeps_input_text() {
        let err = CodecError::parse("int8", b"300", "number too large");
        assert_eq!(
            err.to_string(),
            "parsing int8 from \"300\": number too large"
        );
    }

    #[test]
    fn store_errors_convert() {
        let err: CodecError = StoreError::Config("no root".into()).into();
        assert!(matches!(err, CodecError::Store(StoreError::Config(_))));
    }
}
