// Tests for the line-fed speech capture adapter

use anyhow::Result;
use folio_voice::{
    CaptureAvailability, CaptureBackendFactory, CaptureErrorKind, CaptureEvent, CaptureSource,
    ControllerEvent, LineCapture, QueuedEvent, SpeechCapture, Subscription,
};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn next_capture_event(
    rx: &mut mpsc::UnboundedReceiver<QueuedEvent>,
) -> Result<CaptureEvent> {
    let event = timeout(WAIT, rx.recv())
        .await?
        .ok_or_else(|| anyhow::anyhow!("queue closed"))?;
    match event.event {
        ControllerEvent::Capture(event) => Ok(event),
        other => anyhow::bail!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_cycle_emits_interim_then_final() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = Subscription::new(tx);
    let mut capture = LineCapture::from_reader(&b"show me  your projects\n"[..]);

    capture.start(subscription.sink()).await?;

    assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Started);
    assert!(capture.is_capturing());

    let mut interim = Vec::new();
    let final_text = loop {
        match next_capture_event(&mut rx).await? {
            CaptureEvent::Result { text, is_final: false } => interim.push(text),
            CaptureEvent::Result { text, is_final: true } => break text,
            other => panic!("unexpected event: {:?}", other),
        }
    };

    assert_eq!(interim, vec!["show", "show me", "show me your"]);
    assert_eq!(final_text, "show me your projects");
    assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Ended);
    assert!(!capture.is_capturing());

    Ok(())
}

#[tokio::test]
async fn test_each_cycle_consumes_one_line() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = Subscription::new(tx);
    let mut capture = LineCapture::from_reader(&b"hello\nagain\n"[..]);

    for expected in ["hello", "again"] {
        capture.start(subscription.sink()).await?;
        assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Started);
        assert_eq!(
            next_capture_event(&mut rx).await?,
            CaptureEvent::Result {
                text: expected.to_string(),
                is_final: true
            }
        );
        assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Ended);
    }

    Ok(())
}

#[tokio::test]
async fn test_blank_line_is_no_speech() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = Subscription::new(tx);
    let mut capture = LineCapture::from_reader(&b"   \n"[..]);

    capture.start(subscription.sink()).await?;

    assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Started);
    assert_eq!(
        next_capture_event(&mut rx).await?,
        CaptureEvent::Error(CaptureErrorKind::NoSpeech)
    );
    assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Ended);

    Ok(())
}

#[tokio::test]
async fn test_closed_input_reports_error() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = Subscription::new(tx);
    let mut capture = LineCapture::from_reader(&b""[..]);

    capture.start(subscription.sink()).await?;

    assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Started);
    assert_eq!(
        next_capture_event(&mut rx).await?,
        CaptureEvent::Error(CaptureErrorKind::Other("input closed".to_string()))
    );
    assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Ended);

    Ok(())
}

#[tokio::test]
async fn test_stop_ends_cycle_once() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = Subscription::new(tx);
    let (mut writer, reader) = tokio::io::duplex(64);
    let mut capture = LineCapture::from_reader(reader);

    capture.start(subscription.sink()).await?;
    assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Started);

    capture.stop().await?;
    capture.stop().await?;

    assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Ended);
    assert!(!capture.is_capturing());

    // A line typed after the stop belongs to the next cycle
    writer.write_all(b"late words\n").await?;
    assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());

    capture.start(subscription.sink()).await?;
    assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Started);
    assert_eq!(
        next_capture_event(&mut rx).await?,
        CaptureEvent::Result {
            text: "late".to_string(),
            is_final: false
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_start_while_capturing_is_noop() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = Subscription::new(tx);
    let (_writer, reader) = tokio::io::duplex(64);
    let mut capture = LineCapture::from_reader(reader);

    capture.start(subscription.sink()).await?;
    capture.start(subscription.sink()).await?;

    assert_eq!(next_capture_event(&mut rx).await?, CaptureEvent::Started);
    assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_events_dropped_after_subscription_ends() -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = Subscription::new(tx);
    let mut capture = LineCapture::from_reader(&b"hello\n"[..]);

    let sink = subscription.sink();
    drop(subscription);
    capture.start(sink).await?;

    assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_factory_without_capture() {
    let none = CaptureBackendFactory::create(CaptureSource::None);
    assert_eq!(none.availability(), CaptureAvailability::Unsupported);
    assert!(!none.is_capturing());
}
