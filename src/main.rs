mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use cli::Cli;
use lightsync::audio::decode::decode_audio;
use lightsync::config;
use lightsync::timeline::save_timeline;
use lightsync::{
    optimize_timeline, AudioAnalyzer, Device, FrameParams, LatencyProfiles, RenderSettings,
    TimelineGenerator,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();
    let mut settings = RenderSettings::default();

    // Config values apply only where the CLI is still at its default
    if let Some(ref path) = cli.config.clone().or_else(config::find_config) {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            if cli.fft_size == 2048 { cli.fft_size = cfg.analysis.fft_size; }
            if cli.hop_size == 512 { cli.hop_size = cfg.analysis.hop_size; }
            if cli.intensity == 0.8 { cli.intensity = cfg.render.intensity; }
            if cli.min_interval == 100.0 { cli.min_interval = cfg.render.min_command_interval; }
            if cli.color_mapping == Default::default() { cli.color_mapping = cfg.render.color_mapping; }
            if cli.brightness_mapping == Default::default() {
                cli.brightness_mapping = cfg.render.brightness_mapping;
            }
            if !cli.no_beat_sync { cli.no_beat_sync = !cfg.render.beat_sync; }
            if !cli.no_smooth { cli.no_smooth = !cfg.render.smooth_transitions; }
            settings.zones = cfg.render.zones;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    settings.intensity = cli.intensity;
    settings.color_mapping = cli.color_mapping;
    settings.brightness_mapping = cli.brightness_mapping;
    settings.beat_sync = !cli.no_beat_sync;
    settings.smooth_transitions = !cli.no_smooth;
    settings.min_command_interval = cli.min_interval;

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("lightsync - music to light timeline generator");
    log::info!("Input: {}", cli.input.display());

    // 1. Decode audio
    log::info!("Decoding audio...");
    let audio = decode_audio(&cli.input)?;

    // 2. Analyze
    log::info!("Analyzing audio...");
    let params = FrameParams::new(cli.fft_size, cli.hop_size);
    let features = AudioAnalyzer::new()
        .analyze(&audio, params)
        .context("Audio analysis failed")?;

    if cli.analyze_only {
        println!("Duration: {:.2}s", features.duration);
        println!("Tempo:    {:.1} BPM", features.bpm);
        println!("Beats:    {}", features.beats.len());
        println!("Energy:   {:.3}", features.energy);
        println!("Mood:     {}", features.mood);
        println!("Slices:   {}", features.frequency_data.len());
        return Ok(());
    }

    // 3. Devices and profiles
    let devices_path = cli
        .devices
        .as_ref()
        .context("--devices is required to generate a timeline")?;
    let devices: Vec<Device> = read_json(devices_path)?;
    let profiles: LatencyProfiles = match cli.profiles {
        Some(ref path) => read_json(path)?,
        None => LatencyProfiles::new(),
    };
    log::info!("Devices: {} ({} profiled)", devices.len(), profiles.len());
    for device in &devices {
        if !profiles.contains_key(&device.entity_id) {
            log::info!("No latency profile for {}; using manufacturer estimate", device.entity_id);
        }
    }

    // 4. Generate
    let name = cli.name.clone().unwrap_or_else(|| {
        cli.input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("timeline")
            .to_string()
    });
    let mut timeline =
        TimelineGenerator::new().generate_timeline(&name, &features, &devices, &profiles, &settings);

    if cli.optimize {
        let before = timeline.metadata.command_count;
        timeline = optimize_timeline(&timeline);
        log::info!("Optimized: {} -> {} commands", before, timeline.metadata.command_count);
    }

    let stats = timeline.stats();
    for (entity_id, count) in &stats.per_track {
        log::info!("  {:<32} {} commands", entity_id, count);
    }
    log::info!(
        "Total: {} commands ({:.1}/s), max compensation {:.0}ms",
        stats.total_commands,
        stats.commands_per_second,
        stats.max_compensation_ms
    );

    // 5. Write
    save_timeline(&timeline, &cli.output)
        .with_context(|| format!("Failed to write timeline: {}", cli.output.display()))?;

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
