mod common;

use hrc_cosim::adapters::inbound::read_int_csv;
use hrc_cosim::adapters::outbound::{
    init_buffered_logger, init_noop_logger, write_matrix, write_string_list, WorkcellSimulator,
};
use hrc_cosim::application::SessionService;
use hrc_cosim::common::{IntMatrix, WireError};
use hrc_cosim::config::OutboundFraming;
use hrc_cosim::domains::logger::{DomainLogger, DynLogger};
use hrc_cosim::domains::operations::Agent;
use hrc_cosim::domains::session::AssignmentSequence;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

struct BridgeCapture {
    messages: Arc<Mutex<Vec<String>>>,
}

impl BridgeCapture {
    fn new() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn snapshot(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl DomainLogger for BridgeCapture {
    fn info(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("INFO:{}", msg));
    }
    fn warn(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("WARN:{}", msg));
    }
    fn error(&self, msg: &str) {
        self.messages.lock().unwrap().push(format!("ERR:{}", msg));
    }
}

#[tokio::test]
async fn buffered_logger_forwards_every_level() {
    let capture = Arc::new(BridgeCapture::new());
    let buffered = init_buffered_logger(capture.clone() as DynLogger, 8);

    buffered.info("one");
    buffered.warn("two");
    buffered.error("three");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let msgs = capture.snapshot();
    assert!(msgs.iter().any(|m| m == "INFO:one"));
    assert!(msgs.iter().any(|m| m == "WARN:two"));
    assert!(msgs.iter().any(|m| m == "ERR:three"));

    let noop = init_noop_logger();
    noop.info("ignored");
    noop.error("ignored-err");
}

#[tokio::test]
async fn session_progress_reaches_the_injected_logger() {
    let config = common::config();
    let capture = Arc::new(BridgeCapture::new());
    let backend = WorkcellSimulator::seeded(&config);
    let mut service = SessionService::new(config, capture.clone() as DynLogger, backend);

    // Both tasks to the human, both starting at zero: overlapping on one agent.
    let params = common::parameters(2, 2);
    let (server, mut client) = tokio::io::duplex(64 * 1024);
    let planner = async {
        write_matrix(&mut client, &params.to_matrix()).await?;
        write_string_list(&mut client, &common::identifiers().to_tokens()).await?;
        write_matrix(&mut client, &common::layout(2).to_matrix(&params).unwrap()).await?;
        let assignment = AssignmentSequence::new(vec![Agent::Human, Agent::Human]);
        write_matrix(&mut client, &assignment.to_matrix()).await?;
        read_int_csv(&mut client, OutboundFraming::LegacyCsv, 4096).await?;
        write_matrix(&mut client, &IntMatrix::row_vector(vec![0, 1])).await?;
        write_matrix(&mut client, &IntMatrix::row_vector(vec![0, 0])).await?;
        read_int_csv(&mut client, OutboundFraming::LegacyCsv, 4096).await?;
        client.shutdown().await?;
        Ok::<_, WireError>(())
    };

    let (report, planned) = tokio::join!(service.run(server, CancellationToken::new()), planner);
    planned.unwrap();
    let report = report.unwrap();
    assert_eq!(report.iterations[0].same_agent_overlaps.len(), 1);

    let msgs = capture.snapshot();
    assert!(msgs.iter().any(|m| m.starts_with("INFO:Iteration 1/1 started")));
    assert!(msgs.iter().any(|m| m.starts_with("INFO:Iteration 1: task 2 by human (HumanOp2)")));
    assert!(msgs
        .iter()
        .any(|m| m == "WARN:Iteration 1: HumanOp1 and HumanOp2 overlap on the same agent"));
    assert!(msgs.iter().any(|m| m.contains("closed after 1 iterations")));
    assert!(!msgs.iter().any(|m| m.starts_with("ERR:")));
}
