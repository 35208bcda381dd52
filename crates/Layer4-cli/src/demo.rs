//! Demo - 샘플 리스너와 내장 명령으로 디스패처 동작 시연

use anyhow::Context;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use switchboard_command::{
    CommandContext, CommandResponse, ConnectBehavior, MemoryConnection, MemoryPlatform,
    PermissionCommand, PermissionGranted, PlatformCommand, PlatformConnected, PlatformDirectory,
    PlatformDisconnected, Result as CommandResult,
};
use switchboard_event::{
    ClosureListener, DispatchHandle, Event, EventDispatcher, Handlers, Listener, Priority,
};
use switchboard_foundation::entity::{EntityDirectory, EntityKind};
use switchboard_foundation::permission::{Grant, GrantStore};
use switchboard_foundation::SwitchboardConfig;
use tracing::info;

/// Periodic event used to show ordering, slow handlers and failures.
#[derive(Debug, Default)]
pub struct Tick {
    pub seq: usize,
    pub trail: Vec<&'static str>,
}

impl Event for Tick {
    fn event_name(&self) -> &'static str {
        "demo.tick"
    }
}

// ============================================================================
// Sample listeners
// ============================================================================

/// Prints every domain event the built-in commands publish.
#[derive(Default)]
struct Announcer {
    seen: AtomicUsize,
}

impl Listener for Announcer {
    fn name(&self) -> &str {
        "announcer"
    }

    fn declare(&self, handlers: &mut Handlers<Self>) {
        handlers
            .on_with_priority("granted", Priority::LATE, |me: &Self, e: &mut PermissionGranted| {
                me.announce(format!("{} granted {} to {}", e.granted_by, e.permission.node, e.entity))
            })
            .on("connected", |me: &Self, e: &mut PlatformConnected| {
                me.announce(format!("{} connected by {}", e.platform, e.connected_by))
            })
            .on("disconnected", |me: &Self, e: &mut PlatformDisconnected| {
                me.announce(format!("{} disconnected by {}", e.platform, e.disconnected_by))
            });
    }
}

impl Announcer {
    fn announce(&self, line: String) -> anyhow::Result<()> {
        self.seen.fetch_add(1, Ordering::Relaxed);
        println!("  [event] {line}");
        Ok(())
    }
}

fn tick_listeners() -> Vec<Arc<ClosureListener>> {
    let stamp = ClosureListener::builder("stamp")
        .on_with_priority("first", Priority::FIRST, |tick: &mut Tick| {
            tick.trail.push("stamp");
            Ok(())
        })
        .build();

    let slow = ClosureListener::builder("slow")
        .on("sleep", |tick: &mut Tick| {
            thread::sleep(Duration::from_millis(150));
            tick.trail.push("slow");
            Ok(())
        })
        .build();

    // every third tick fails; later handlers still run
    let flaky = ClosureListener::builder("flaky")
        .on_with_priority("every-third", Priority::LATE, |tick: &mut Tick| {
            tick.trail.push("flaky");
            anyhow::ensure!(tick.seq % 3 != 2, "tick {} rejected", tick.seq);
            Ok(())
        })
        .on_with_priority("last", Priority::LAST, |tick: &mut Tick| {
            tick.trail.push("last");
            Ok(())
        })
        .build();

    vec![stamp, slow, flaky]
}

// ============================================================================
// Demo
// ============================================================================

pub fn run(config: &SwitchboardConfig, asynchronous: bool, events: usize) -> anyhow::Result<()> {
    let dispatcher = Arc::new(
        EventDispatcher::start(config).context("Failed to start execution engine")?,
    );

    let announcer = Arc::new(Announcer::default());
    dispatcher.register_listener(&announcer)?;
    for listener in tick_listeners() {
        dispatcher.register_listener(&listener)?;
    }
    info!(listeners = dispatcher.listener_count(), "Demo listeners registered");

    run_commands(&dispatcher)?;
    run_ticks(&dispatcher, asynchronous, events);

    println!(
        "\n{} domain events announced, {} listeners registered",
        announcer.seen.load(Ordering::Relaxed),
        dispatcher.listener_count()
    );
    dispatcher.shutdown();
    Ok(())
}

fn run_commands(dispatcher: &Arc<EventDispatcher>) -> anyhow::Result<()> {
    let entities = Arc::new(EntityDirectory::new());
    let grants = Arc::new(GrantStore::new());

    let operators = entities.add(EntityKind::Group, "operators");
    let root = entities.add(EntityKind::User, "root");
    entities.add(EntityKind::User, "alice");
    grants.add_member(&operators, &root)?;
    for node in [
        PermissionCommand::NODE_LIST,
        PermissionCommand::NODE_ADD,
        PlatformCommand::NODE_LIST,
        PlatformCommand::NODE_INFO,
        PlatformCommand::NODE_CONNECT,
        PlatformCommand::NODE_DISCONNECT,
    ] {
        grants.set_permission(&operators, node, Grant::Allow, "bootstrap");
    }

    let platforms = PlatformDirectory::new();
    platforms.add(Arc::new(
        MemoryPlatform::new("irc")
            .with_plugin("switchboard:irc")
            .with_connection(Arc::new(MemoryConnection::new("irc"))),
    ));
    platforms.add(Arc::new(
        MemoryPlatform::new("matrix").with_connection(Arc::new(
            MemoryConnection::new("matrix")
                .on_connect(ConnectBehavior::Fail("homeserver unreachable".into())),
        )),
    ));
    platforms.add(Arc::new(MemoryPlatform::new("slack")));

    let ctx = CommandContext::new(root, grants.clone());
    let permissions = PermissionCommand::new(grants, entities, Arc::clone(dispatcher));
    let platforms = PlatformCommand::new(Arc::new(platforms), Arc::clone(dispatcher));

    println!("== {} ==", permissions.description());
    show(
        "permission add user alice chat.send",
        permissions.add(&ctx, EntityKind::User, "alice", "Chat.Send", Grant::Allow),
    );
    show(
        "permission add user alice chat.send",
        permissions.add(&ctx, EntityKind::User, "alice", "chat.send", Grant::Allow),
    );
    show(
        "permission list user alice",
        permissions.list(&ctx, EntityKind::User, "alice", 1),
    );
    show("permission test system.permission.remove", permissions.test(&ctx, "system.permission.remove"));

    println!("\n== {} ==", platforms.description());
    show("platform connect irc", platforms.connect(&ctx, "irc"));
    show("platform connect matrix", platforms.connect(&ctx, "matrix"));
    show("platform connect slack", platforms.connect(&ctx, "slack"));
    show("platform list", platforms.list(&ctx, 1));
    show("platform info irc", platforms.info(&ctx, "irc"));
    show("platform disconnect irc", platforms.disconnect(&ctx, "irc"));

    Ok(())
}

fn show(label: &str, outcome: CommandResult<CommandResponse>) {
    println!("> {label}");
    match outcome {
        Ok(response) => println!("{response}"),
        Err(err) => println!("error: {err}"),
    }
}

fn run_ticks(dispatcher: &EventDispatcher, asynchronous: bool, events: usize) {
    println!("\n== ticks ({}) ==", if asynchronous { "async" } else { "sync" });
    let started = Instant::now();

    if asynchronous {
        let handles: Vec<(usize, DispatchHandle<Tick>)> = (0..events)
            .map(|seq| (seq, dispatcher.publish_async(Tick { seq, ..Tick::default() })))
            .collect();
        println!("  submitted {} ticks in {:?}", events, started.elapsed());

        for (seq, handle) in handles {
            report(seq, handle.wait());
        }
    } else {
        for seq in 0..events {
            report(seq, dispatcher.publish(Tick { seq, ..Tick::default() }));
        }
    }

    println!("  finished in {:?}", started.elapsed());
}

fn report(seq: usize, outcome: switchboard_event::Result<Tick>) {
    match outcome {
        Ok(tick) => println!("  tick {seq}: {}", tick.trail.join(" -> ")),
        Err(err) => println!("  tick {seq}: failed: {err}"),
    }
}
