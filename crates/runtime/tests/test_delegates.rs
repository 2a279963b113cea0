//! Delegates on the message bus: negative-id targets serviced by the
//! system loop, with responses routed back to the sending agent.

use agerun_core::{Data, EventLog, MemorySink};
use agerun_runtime::{FileDelegate, LogDelegate, NetworkDelegate, System};
use std::rc::Rc;

fn test_system() -> (System, Rc<EventLog>, MemorySink) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let sink = MemorySink::new();
    let log = Rc::new(EventLog::with_sink(Box::new(sink.clone())));
    (System::with_log(log.clone()), log, sink)
}

fn file_request(action: &str, path: &str, content: Option<&str>) -> Data {
    let mut message = Data::map();
    message.set_path_string("action", action);
    message.set_path_string("path", path);
    if let Some(content) = content {
        message.set_path_string("content", content);
    }
    message
}

/// An agent that copies delegate responses into its memory.
const RESPONDER_SOURCE: &str = "memory.status := message.status\n\
                                memory.detail := message.message";

#[test]
fn test_file_delegate_path_escape_rejected() {
    let (mut system, log, _sink) = test_system();
    let dir = tempfile::tempdir().unwrap();
    system.register_delegate(-1, Box::new(FileDelegate::new(log, dir.path(), 0)));

    assert!(system.compile_method("responder", RESPONDER_SOURCE, "1.0.0"));
    let agent = system.spawn("responder", "1.0.0", Data::map()).unwrap();
    system.run_until_idle();

    // The agent asks the file delegate to read outside its sandbox
    assert!(system.delegation_mut().send_to_delegate(
        -1,
        agent,
        file_request("read", "../secret", None),
    ));
    system.run_until_idle();

    let memory = system.agents().get(agent).unwrap().memory();
    assert_eq!(memory.get_path_string("status"), Some("error"));
    assert_eq!(memory.get_path_string("detail"), Some("Invalid path"));
}

#[test]
fn test_file_delegate_write_then_read_through_system() {
    let (mut system, log, _sink) = test_system();
    let dir = tempfile::tempdir().unwrap();
    system.register_delegate(-1, Box::new(FileDelegate::new(log, dir.path(), 0)));

    assert!(system.compile_method(
        "reader",
        "memory.status := message.status\nmemory.content := message.content",
        "1.0.0",
    ));
    let agent = system.spawn("reader", "1.0.0", Data::map()).unwrap();
    system.run_until_idle();

    system.delegation_mut().send_to_delegate(
        -1,
        agent,
        file_request("write", "note.txt", Some("stored")),
    );
    system.run_until_idle();
    assert_eq!(
        system.agents().get(agent).unwrap().memory().get_path_string("status"),
        Some("success")
    );

    system.delegation_mut().send_to_delegate(-1, agent, file_request("read", "note.txt", None));
    system.run_until_idle();
    assert_eq!(
        system.agents().get(agent).unwrap().memory().get_path_string("content"),
        Some("stored")
    );
    assert!(dir.path().join("note.txt").exists());
}

#[test]
fn test_log_delegate_emits_for_sender() {
    let (mut system, log, sink) = test_system();
    system.register_delegate(-2, Box::new(LogDelegate::new(log, Some("info"))));

    assert!(system.compile_method("responder", RESPONDER_SOURCE, "1.0.0"));
    let agent = system.spawn("responder", "1.0.0", Data::map()).unwrap();
    system.run_until_idle();

    let mut request = Data::map();
    request.set_path_string("level", "error");
    request.set_path_string("message", "disk full");
    system.delegation_mut().send_to_delegate(-2, agent, request);
    system.run_until_idle();

    assert_eq!(
        system.agents().get(agent).unwrap().memory().get_path_string("status"),
        Some("success")
    );

    system.log().flush();
    let line = sink
        .events()
        .iter()
        .map(|event| event.message.clone())
        .find(|message| message.contains("level=error"))
        .unwrap();
    assert!(line.contains(&format!("agent={agent}")));
    assert!(line.contains("message=disk full"));
}

#[test]
fn test_network_delegate_stub_through_adapter_drain() {
    let (mut system, log, _sink) = test_system();
    system.register_delegate(
        -3,
        Box::new(NetworkDelegate::new(log, vec!["https://api.example.com/".to_string()], 0, 0)),
    );

    // Adapter-thread pattern: the host drains the queue itself
    let mut request = Data::map();
    request.set_path_string("action", "GET");
    request.set_path_string("url", "https://api.example.com/users");
    assert!(system.delegation_mut().send_to_delegate(-3, 7, request));
    assert!(system.delegation().delegate_has_messages(-3));

    let (sender, message) = system.delegation_mut().take_delegate_message(-3).unwrap();
    assert_eq!(sender, 7);
    assert_eq!(message.get_path_string("url"), Some("https://api.example.com/users"));
    assert!(!system.delegation().delegate_has_messages(-3));
}

#[test]
fn test_network_delegate_whitelist_via_step() {
    let (mut system, log, _sink) = test_system();
    system.register_delegate(
        -3,
        Box::new(NetworkDelegate::new(log, vec!["https://api.example.com/".to_string()], 0, 0)),
    );

    assert!(system.compile_method("responder", RESPONDER_SOURCE, "1.0.0"));
    let agent = system.spawn("responder", "1.0.0", Data::map()).unwrap();
    system.run_until_idle();

    let mut request = Data::map();
    request.set_path_string("action", "GET");
    request.set_path_string("url", "https://evil.example.net/");
    system.delegation_mut().send_to_delegate(-3, agent, request);
    system.run_until_idle();

    let memory = system.agents().get(agent).unwrap().memory();
    assert_eq!(memory.get_path_string("status"), Some("error"));
    assert_eq!(memory.get_path_string("detail"), Some("URL not whitelisted"));
}

#[test]
fn test_delegate_processed_before_agents_one_per_step() {
    let (mut system, log, _sink) = test_system();
    let dir = tempfile::tempdir().unwrap();
    system.register_delegate(-1, Box::new(FileDelegate::new(log, dir.path(), 0)));

    assert!(system.compile_method("responder", RESPONDER_SOURCE, "1.0.0"));
    let agent = system.spawn("responder", "1.0.0", Data::map()).unwrap();
    system.run_until_idle();

    system.delegation_mut().send_to_delegate(
        -1,
        agent,
        file_request("write", "a.txt", Some("x")),
    );
    system.deliver(agent, Data::map());

    // The pending delegate message wins the first step
    assert!(system.step());
    assert!(!system.delegation().delegate_has_messages(-1));
    // Response plus the host message are now queued on the agent
    assert_eq!(system.agents().get(agent).unwrap().queue_len(), 2);
}

#[test]
fn test_send_to_unregistered_delegate_drops() {
    let (mut system, _log, _sink) = test_system();
    assert!(!system.deliver(-9, Data::from("nobody home")));
    assert!(system.log().last_warning().is_some());
    assert!(!system.step());
}

#[test]
fn test_agent_sends_to_delegate_via_instruction() {
    let (mut system, log, _sink) = test_system();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("greeting.txt"), "hello from disk").unwrap();
    system.register_delegate(-1, Box::new(FileDelegate::new(log, dir.path(), 0)));

    // The request map is assembled with parse() and sent once: after
    // the first message the send target flips to 0 (dropped), so the
    // delegate's response does not trigger another request
    assert!(system.compile_method(
        "fetcher",
        "memory.req := parse(\"action={action};path={path}\", \"action=read;path=greeting.txt\")\n\
         memory.target := if(memory.sent = 1, 0, -1)\n\
         memory.sent := 1\n\
         send(memory.target, memory.req)\n\
         memory.content := message.content",
        "1.0.0",
    ));
    let agent = system.spawn("fetcher", "1.0.0", Data::map()).unwrap();
    system.run_until_idle();

    assert_eq!(
        system.agents().get(agent).unwrap().memory().get_path_string("content"),
        Some("hello from disk")
    );
}
