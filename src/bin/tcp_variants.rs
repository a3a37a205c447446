//! 线性链拓扑上的拥塞控制变体对比实验
//!
//! 在两种固定形状的链式拓扑上运行一条（或两条）可靠流与一条 CBR 背景流，
//! 结束后把各流的原始计数归约为吞吐量/平均时延/丢包率并打印摘要。

use clap::Parser;
use ccsim_rs::exp::{self, ExperimentConfig, RunSummary};
use ccsim_rs::queue::QueueKind;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "tcp-variants",
    about = "线性链拓扑仿真：拥塞控制变体（NewReno/Vegas）对比实验"
)]
struct Args {
    /// 场景选择（1 = 5 节点链，2 = 9 节点链）
    #[arg(long, default_value_t = 1)]
    scenario: u32,

    /// 主可靠流的拥塞控制变体（NewReno|Vegas；Reno/Tahoe 回退为 NewReno）
    #[arg(long, default_value = "Vegas")]
    variant: String,

    /// 链路队列策略（DropTail|RED）
    #[arg(long, default_value = "DropTail")]
    queue: String,

    /// CBR 发送速率（Mbps）
    #[arg(long, default_value_t = 1.0)]
    cbr_rate_mbps: f64,

    /// 仿真运行时长（秒）；场景 2 不足 100 秒时会被抬高到 100 秒
    #[arg(long, default_value_t = 50)]
    run_time: u64,

    /// CBR 包大小（字节）
    #[arg(long, default_value_t = 950)]
    cbr_pkt_size: u32,

    /// 可靠流段大小（字节）
    #[arg(long, default_value_t = 1000)]
    seg_size: u32,

    /// 将运行摘要写出为 JSON 文件；不填则不生成
    #[arg(long)]
    metrics_json: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("configuration error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), exp::ConfigError> {
    // 与既有脚本约定一致：只有 "RED" 启用 AQM，其余一律 DropTail
    let queue = if args.queue.eq_ignore_ascii_case("red") {
        QueueKind::Red
    } else {
        QueueKind::DropTail
    };

    let experiment = exp::setup(ExperimentConfig {
        scenario_selector: args.scenario,
        requested_variant: args.variant,
        queue,
        cbr_rate_mbps: args.cbr_rate_mbps,
        run_time_secs: args.run_time,
        cbr_pkt_bytes: args.cbr_pkt_size,
        seg_bytes: args.seg_size,
    })?;

    let report = experiment.run();
    let records = report.flow_stats();
    let metrics = exp::aggregate(&records);

    let summary = RunSummary {
        scenario: report.scenario().selector(),
        variant: report.resolution().resolved_name().to_string(),
        queue: report.queue().name().to_string(),
        cbr_rate_mbps: report.cbr_rate_mbps(),
        run_time_secs: report.run_time_secs(),
        metrics,
    };
    println!("{summary}");

    if let Some(path) = args.metrics_json {
        let json = serde_json::to_string_pretty(&summary).expect("serialize run summary");
        fs::write(&path, json).expect("write metrics json");
        eprintln!("wrote metrics to {}", path.display());
    }

    Ok(())
}
