use std::cell::RefCell;
use std::rc::Rc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tempus::{
    handler_fn, Event, Expire, Expiry, Link, LinkConfig, Packet, Periodic, RealTimeConfig,
    RealTimeScheduler, RecordingSink, Scheduler, SchedulerKind, TempusResult,
    TimerHandler,
};

/// Drive a packet source through a delay link on a chosen scheduler.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// Queue discipline: list, heap, calendar or realtime
    #[arg(short, long, default_value = "calendar")]
    scheduler: SchedulerKind,

    /// Packets to send
    #[arg(short, long, default_value_t = 20)]
    packets: u64,

    /// Packet size in bytes
    #[arg(long, default_value_t = 1000)]
    size: u32,

    /// Seconds between packets
    #[arg(long, default_value_t = 0.005)]
    interval: f64,

    /// Link bandwidth in bits per second
    #[arg(short, long, default_value_t = 1_000_000.0)]
    bandwidth: f64,

    /// One-way propagation delay in seconds
    #[arg(short, long, default_value_t = 0.010)]
    delay: f64,

    /// Transmit queue limit in packets
    #[arg(long, default_value_t = 16)]
    queue_limit: usize,

    /// Heartbeat timer period in seconds
    #[arg(long, default_value_t = 0.05)]
    heartbeat: f64,

    /// Print scheduler statistics as JSON
    #[cfg(feature = "serialize")]
    #[arg(long)]
    json: bool,
}

/// Sends one packet into the link per expiry.
struct Source {
    link: Rc<RefCell<Link>>,
    size: u32,
    interval: f64,
    sent: u64,
    limit: u64,
}

impl Expire for Source {
    fn expire(&mut self, ctx: &mut Expiry<'_>) {
        self.sent += 1;
        let packet = Packet::new(self.sent, self.size, ctx.now());
        self.link.borrow_mut().enqueue(ctx.scheduler(), packet);
        if self.sent < self.limit {
            ctx.resched(self.interval);
        }
    }
}

fn main() -> TempusResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    println!("═══════════════════════════════════════════════════════");
    println!("  Tempus — Discrete-Event Scheduling Core");
    println!("  Link + heartbeat demo on the {} scheduler", args.scheduler);
    println!("═══════════════════════════════════════════════════════");
    println!();

    let link = Link::new(LinkConfig::new(args.bandwidth, args.delay, args.queue_limit)?);
    let sink = Rc::new(RefCell::new(RecordingSink::new()));
    link.borrow_mut().connect(sink.clone());

    let source = TimerHandler::new(Source {
        link: link.clone(),
        size: args.size,
        interval: args.interval,
        sent: 0,
        limit: args.packets,
    });
    let beats = Rc::new(RefCell::new(0u64));
    let heartbeat = {
        let beats = beats.clone();
        TimerHandler::new(Periodic::new(args.heartbeat, move |_ctx: &mut Expiry<'_>| {
            *beats.borrow_mut() += 1
        }))
    };

    // The heartbeat never stops on its own; end the run once the last
    // packet has had time to arrive.
    let tx = f64::from(args.size) * 8.0 / args.bandwidth;
    let horizon = args.packets as f64 * args.interval.max(tx) + args.delay + 1.0;
    let stop = handler_fn(|s: &mut Scheduler, _e: &Event| s.halt());
    let stop_ev = Event::new();

    let seed = |sched: &mut Scheduler| {
        source.borrow_mut().sched(sched, 0.0);
        heartbeat.borrow_mut().sched(sched, args.heartbeat);
        sched.schedule(&stop, &stop_ev, horizon);
    };

    let (dispatched, stats) = if args.scheduler.is_realtime() {
        let mut rt = RealTimeScheduler::new(RealTimeConfig::default())?;
        seed(rt.scheduler_mut());
        let n = rt.run();
        println!("  Drift warnings: {}", rt.drift_warnings());
        (n, rt.scheduler().stats())
    } else {
        let mut sched = Scheduler::new(args.scheduler.discipline());
        seed(&mut sched);
        let n = sched.run();
        (n, sched.stats())
    };

    let link_stats = link.borrow().stats();
    println!("  Events dispatched: {}", dispatched);
    println!("  Virtual clock:     {}", stats.clock);
    println!("  Heartbeats:        {}", beats.borrow());
    println!(
        "  Packets:           {} sent, {} delivered, {} dropped",
        source.borrow().inner().sent,
        link_stats.delivered,
        link_stats.dropped
    );
    match sink.borrow().mean_latency() {
        Some(latency) => println!("  Mean latency:      {:.6}s", latency),
        None => println!("  Mean latency:      n/a"),
    }
    if let Some(cal) = stats.calendar {
        println!(
            "  Calendar:          {} resizes, {:.2} probes/op, {} direct searches",
            cal.resizes,
            cal.probes_per_op(),
            cal.direct_searches
        );
    }

    #[cfg(feature = "serialize")]
    {
        if args.json {
            println!();
            println!("{}", stats.to_json());
        }
    }

    println!();
    println!("  ✓ Demo complete.");
    Ok(())
}
