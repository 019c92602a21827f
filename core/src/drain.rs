//! Whole-body buffering of a transport's event stream.
//!
//! The first terminal event wins: once `End` or `Error` is seen, everything
//! after it is dropped, so a call reports exactly one outcome.

use bytes::{Bytes, BytesMut};

use crate::error::TransportError;
use crate::http::{HttpResponse, Payload, RequestDescriptor, ResponseHead};
use crate::transport::{Transport, TransportEvent};

#[derive(Debug, Default)]
pub struct BodyCollector {
    head: Option<ResponseHead>,
    chunks: Vec<Bytes>,
    outcome: Option<Result<(), TransportError>>,
}

impl BodyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, event: TransportEvent) {
        if self.outcome.is_some() {
            tracing::trace!(?event, "ignoring event after terminal event");
            return;
        }
        match event {
            TransportEvent::Head(head) => self.head = Some(head),
            TransportEvent::Data(chunk) => {
                tracing::trace!(len = chunk.len(), "body chunk");
                self.chunks.push(chunk);
            }
            TransportEvent::End => self.outcome = Some(Ok(())),
            TransportEvent::Error(err) => self.outcome = Some(Err(err)),
        }
    }

    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    /// The drained response, with `body` holding the raw bytes.
    pub fn finish(self) -> Result<HttpResponse, TransportError> {
        match self.outcome {
            None => return Err(TransportError::Incomplete),
            Some(Err(err)) => return Err(err),
            Some(Ok(())) => {}
        }
        let head = self.head.ok_or(TransportError::MissingHead)?;
        Ok(HttpResponse {
            status: head.status,
            headers: head.headers,
            body: Payload::Bytes(concat(self.chunks)),
        })
    }
}

fn concat(mut chunks: Vec<Bytes>) -> Bytes {
    match chunks.len() {
        0 => Bytes::new(),
        1 => chunks.remove(0),
        _ => {
            let mut buf = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
            for chunk in &chunks {
                buf.extend_from_slice(chunk);
            }
            buf.freeze()
        }
    }
}

/// Send `request` and buffer the whole response.
pub fn collect(
    transport: &dyn Transport,
    request: &RequestDescriptor,
) -> Result<HttpResponse, TransportError> {
    let mut collector = BodyCollector::new();
    transport.dispatch(request, &mut |event| collector.accept(event));
    collector.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_events(events: Vec<TransportEvent>) -> Result<HttpResponse, TransportError> {
        let mut collector = BodyCollector::new();
        for event in events {
            collector.accept(event);
        }
        collector.finish()
    }

    #[test]
    fn concatenates_chunks_in_order() {
        let response = collect_events(vec![
            TransportEvent::Head(ResponseHead::new(200)),
            TransportEvent::Data(Bytes::from_static(b"ab")),
            TransportEvent::Data(Bytes::from_static(b"cd")),
            TransportEvent::End,
        ])
        .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, Payload::Bytes(Bytes::from_static(b"abcd")));
    }

    #[test]
    fn no_chunks_is_empty_body() {
        let response = collect_events(vec![
            TransportEvent::Head(ResponseHead::new(204)),
            TransportEvent::End,
        ])
        .unwrap();
        assert_eq!(response.body.as_bytes(), b"");
    }

    #[test]
    fn error_before_end_wins() {
        let err = collect_events(vec![
            TransportEvent::Head(ResponseHead::new(200)),
            TransportEvent::Data(Bytes::from_static(b"partial")),
            TransportEvent::Error(TransportError::Stream("reset".into())),
            TransportEvent::End,
        ])
        .unwrap_err();
        assert_eq!(err, TransportError::Stream("reset".into()));
    }

    #[test]
    fn end_before_error_wins() {
        let response = collect_events(vec![
            TransportEvent::Head(ResponseHead::new(200)),
            TransportEvent::End,
            TransportEvent::Error(TransportError::Stream("late".into())),
            TransportEvent::Data(Bytes::from_static(b"late")),
        ])
        .unwrap();
        assert_eq!(response.body.as_bytes(), b"");
    }

    #[test]
    fn missing_terminal_event_is_incomplete() {
        let err = collect_events(vec![TransportEvent::Head(ResponseHead::new(200))]).unwrap_err();
        assert_eq!(err, TransportError::Incomplete);
    }

    #[test]
    fn end_without_head_is_reported() {
        let err = collect_events(vec![TransportEvent::End]).unwrap_err();
        assert_eq!(err, TransportError::MissingHead);
    }
}
