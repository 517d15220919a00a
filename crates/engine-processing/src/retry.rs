use crate::error::PipelineError;
use connectors::error::{SinkError, StageError, TransferError};
use engine_core::retry::RetryDisposition;

/// Whether a failed partition attempt is worth restarting from fetch.
pub fn classify_pipeline_error(err: &PipelineError) -> RetryDisposition {
    match err {
        PipelineError::Format(_) => RetryDisposition::Stop,
        PipelineError::Cancelled => RetryDisposition::Stop,
        PipelineError::Transfer(err) => classify_transfer_error(err),
        PipelineError::Stage(err) => classify_stage_error(err),
        PipelineError::Decode(_) => RetryDisposition::Retry,
        PipelineError::Sink(err) => classify_sink_error(err),
        PipelineError::Observer { .. } => RetryDisposition::Retry,
        PipelineError::Task(_) => RetryDisposition::Stop,
    }
}

pub fn classify_transfer_error(err: &TransferError) -> RetryDisposition {
    match err {
        TransferError::Status { .. } | TransferError::Http(_) | TransferError::Io(_) => {
            RetryDisposition::Retry
        }
        TransferError::UnsupportedScheme(_) => RetryDisposition::Stop,
    }
}

pub fn classify_stage_error(err: &StageError) -> RetryDisposition {
    match err {
        StageError::Io(_) | StageError::Upload { .. } => RetryDisposition::Retry,
        StageError::MissingCredential(_) => RetryDisposition::Stop,
    }
}

pub fn classify_sink_error(err: &SinkError) -> RetryDisposition {
    match err {
        SinkError::InvalidUrl(_) | SinkError::UnsupportedType { .. } => RetryDisposition::Stop,
        SinkError::Database(_)
        | SinkError::Tls(_)
        | SinkError::TableNotFound(_)
        | SinkError::UnknownColumn { .. }
        | SinkError::IncompatibleColumn { .. }
        | SinkError::Unavailable(_) => RetryDisposition::Retry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::error::DecodeError;
    use model::error::FormatError;

    #[test]
    fn format_and_cancellation_are_fatal() {
        let err = PipelineError::Format(FormatError::Unrecognized("x.xlsx".into()));
        assert_eq!(classify_pipeline_error(&err), RetryDisposition::Stop);
        assert_eq!(classify_pipeline_error(&PipelineError::Cancelled), RetryDisposition::Stop);
    }

    #[test]
    fn transport_and_payload_failures_retry() {
        let transfer = PipelineError::Transfer(TransferError::Status {
            url: "http://example.test/a.csv.gz".into(),
            status: 503,
        });
        let decode = PipelineError::Decode(DecodeError::MissingHeader);
        let sink = PipelineError::Sink(SinkError::IncompatibleColumn {
            table: "public.t".into(),
            column: "fare".into(),
            expected: "BIGINT".into(),
            found: "TEXT".into(),
        });
        for err in [transfer, decode, sink] {
            assert_eq!(classify_pipeline_error(&err), RetryDisposition::Retry, "{err}");
        }
    }

    #[test]
    fn configuration_problems_stop() {
        let scheme = PipelineError::Transfer(TransferError::UnsupportedScheme("ftp://x".into()));
        let url = PipelineError::Sink(SinkError::InvalidUrl("nope".into()));
        let creds = PipelineError::Stage(StageError::MissingCredential("S3_ACCESS_KEY"));
        for err in [scheme, url, creds] {
            assert_eq!(classify_pipeline_error(&err), RetryDisposition::Stop, "{err}");
        }
    }
}
