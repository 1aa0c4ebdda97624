use std::time::Duration;
use tapcheckout::config::Timings;
use tapcheckout::domain::ports::{FeedbackBox, PresenterBox, ScreenUpdate, TagReaderBox, Tone};
use tapcheckout::domain::tag::{TagRead, text_record};
use tapcheckout::error::PaymentError;
use tapcheckout::flow::delay::{DelayPolicyBox, DelayStep, RandomDelays, ZeroDelays};
use tapcheckout::infrastructure::in_memory::{
    RecordingFeedback, RecordingPresenter, ScriptedTagReader,
};

#[tokio::test]
async fn test_ports_as_trait_objects() {
    let tags = ScriptedTagReader::new();
    let presenter = RecordingPresenter::new();
    let feedback = RecordingFeedback::new();

    let reader: TagReaderBox = Box::new(tags.clone());
    let presenter_box: PresenterBox = Box::new(presenter.clone());
    let feedback_box: FeedbackBox = Box::new(feedback.clone());

    tags.present_text("PAY");

    // Verify Send + Sync by spawning tasks
    let read_handle = tokio::spawn(async move { reader.read_tag().await.unwrap() });
    let show_handle = tokio::spawn(async move {
        presenter_box.render(&ScreenUpdate::PinEntry);
        presenter_box.error(&PaymentError::IncorrectPin);
        feedback_box.play_tone(Tone::Ack);
        feedback_box.vibrate(128, Duration::from_millis(150));
    });

    let payload = read_handle.await.unwrap();
    assert_eq!(TagRead::from(payload), TagRead::Payload(text_record("PAY")));
    show_handle.await.unwrap();

    assert_eq!(presenter.updates(), vec![ScreenUpdate::PinEntry]);
    assert_eq!(presenter.errors(), vec![PaymentError::IncorrectPin]);
    assert_eq!(feedback.tones(), vec![Tone::Ack]);
}

#[tokio::test]
async fn test_delay_policies_are_interchangeable() {
    let policies: Vec<DelayPolicyBox> = vec![
        Box::new(ZeroDelays),
        Box::new(RandomDelays::new(Timings::default(), Some(3))),
    ];

    let handle = tokio::spawn(async move {
        policies
            .into_iter()
            .map(|mut policy| policy.delay(DelayStep::UpiApproval))
            .collect::<Vec<_>>()
    });

    let delays = handle.await.unwrap();
    assert_eq!(delays, vec![Duration::ZERO, Duration::from_secs(35)]);
}
