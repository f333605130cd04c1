// crates/host/tests/worker_tests.rs

mod common;

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use calendar_agent_core::ai_client::{ChatRequest, CompletionClient};
use calendar_agent_host::clarify;
use calendar_agent_host::pipeline::Pipeline;
use calendar_agent_host::worker::{PipelineWorker, WorkerEvent};

use common::{
    options, RecordingDesktop, ScriptedClient, StageKind, DIVING_ANALYSIS, PARTIAL_ANALYSIS,
};

const WAIT: Duration = Duration::from_secs(10);

fn worker(
    client: ScriptedClient,
    desktop: RecordingDesktop,
) -> (PipelineWorker<ScriptedClient, RecordingDesktop>, Receiver<WorkerEvent>) {
    let pipeline = Pipeline::new(Arc::new(client), Arc::new(desktop), "test-model", options());
    PipelineWorker::new(Arc::new(pipeline))
}

fn next(rx: &Receiver<WorkerEvent>) -> WorkerEvent {
    rx.recv_timeout(WAIT).expect("worker event")
}

#[test]
fn runs_to_completion_and_goes_idle() {
    let client = ScriptedClient::new()
        .reply(StageKind::Extract, DIVING_ANALYSIS)
        .reply(StageKind::Generate, "make the event");
    let (worker, rx) = worker(client, RecordingDesktop::ok("Event created"));

    worker.submit("diving on August 22nd at 8am").unwrap();

    match next(&rx) {
        WorkerEvent::Started(input) => assert_eq!(input, "diving on August 22nd at 8am"),
        other => panic!("unexpected event: {:?}", other),
    }
    match next(&rx) {
        WorkerEvent::Finished(Ok(report)) => {
            assert_eq!(report.result.as_deref(), Some("Event created"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(!worker.is_busy());
    worker.join();
}

#[test]
fn refuses_a_second_request_while_busy() {
    let (release, gate) = mpsc::channel();
    let client = ScriptedClient::new()
        .reply(StageKind::Extract, DIVING_ANALYSIS)
        .reply(StageKind::Generate, "make the event");
    let (worker, rx) = worker(client, RecordingDesktop::gated("done", gate));

    worker.submit("first").unwrap();
    assert!(worker.is_busy());

    let err = worker.submit("second").unwrap_err();
    assert!(err.to_string().contains("already running"));

    release.send(()).unwrap();
    assert!(matches!(next(&rx), WorkerEvent::Started(_)));
    assert!(matches!(next(&rx), WorkerEvent::Finished(Ok(_))));

    worker.join();
    assert!(!worker.is_busy());

    release.send(()).unwrap();
    worker.submit("third").unwrap();
    assert!(matches!(next(&rx), WorkerEvent::Started(_)));
    assert!(matches!(next(&rx), WorkerEvent::Finished(Ok(_))));
    worker.join();
}

#[test]
fn questions_round_trip_through_the_front_end() {
    let client = ScriptedClient::new()
        .reply(StageKind::Extract, PARTIAL_ANALYSIS)
        .reply(StageKind::Generate, "make the event");
    let (worker, rx) = worker(client, RecordingDesktop::ok("done"));

    worker.submit("dentist next Friday at 9:30").unwrap();
    assert!(matches!(next(&rx), WorkerEvent::Started(_)));

    match next(&rx) {
        WorkerEvent::Questions(qs) => {
            assert_eq!(qs.len(), 2);
            assert!(worker.is_busy());
            let answers = vec![
                clarify::answer(&qs[0], "1 hour"),
                clarify::answer(&qs[1], "  "),
            ];
            worker.answer(answers.into_iter().flatten().collect()).unwrap();
        }
        other => panic!("unexpected event: {:?}", other),
    }

    match next(&rx) {
        WorkerEvent::Finished(Ok(report)) => {
            assert!(report.clarified);
            assert_eq!(report.event.duration.as_deref(), Some("1 hour"));
            assert_eq!(report.event.location, "");
        }
        other => panic!("unexpected event: {:?}", other),
    }
    worker.join();
}

#[test]
fn failures_arrive_as_messages() {
    let client = ScriptedClient::new()
        .reply(StageKind::Extract, DIVING_ANALYSIS)
        .reply(StageKind::Generate, "make the event");
    let (worker, rx) = worker(client, RecordingDesktop::failing());

    worker.submit("diving").unwrap();
    assert!(matches!(next(&rx), WorkerEvent::Started(_)));
    match next(&rx) {
        WorkerEvent::Finished(Err(message)) => {
            assert!(message.contains("remote execution failed"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(!worker.is_busy());
    worker.join();
}

#[test]
fn answering_without_a_run_is_an_error() {
    let (worker, _rx) = worker(ScriptedClient::new(), RecordingDesktop::ok("done"));
    assert!(worker.answer(Vec::new()).is_err());
}

struct ExplodingClient;

impl CompletionClient for ExplodingClient {
    fn complete(&self, _request: ChatRequest) -> Result<String> {
        panic!("model client blew up");
    }
}

#[test]
fn a_panicking_run_still_finishes() {
    let pipeline = Pipeline::new(
        Arc::new(ExplodingClient),
        Arc::new(RecordingDesktop::ok("done")),
        "test-model",
        options(),
    );
    let (worker, rx) = PipelineWorker::new(Arc::new(pipeline));

    worker.submit("diving").unwrap();
    assert!(matches!(next(&rx), WorkerEvent::Started(_)));
    match next(&rx) {
        WorkerEvent::Finished(Err(message)) => assert!(message.contains("panicked")),
        other => panic!("unexpected event: {:?}", other),
    }
    assert!(!worker.is_busy());
    worker.join();

    worker.submit("again").unwrap();
    assert!(matches!(next(&rx), WorkerEvent::Started(_)));
    assert!(matches!(next(&rx), WorkerEvent::Finished(Err(_))));
    worker.join();
}
