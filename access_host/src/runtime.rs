use std::{fs, path::Path, rc::Rc};

use access_screen::{
    DisplayEvent, EngineContext, EventPump, FadeStatus, RecordingDisplay, Rect, ResourceLoader,
    ScreenConfig, Screen, ScriptedEvents, TimerTable, PALETTE_COUNT,
};
use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;

use crate::cli::{PaletteSource, SessionArgs};
use crate::resources::{grey_ramp_resources, ContainerResources, GREY_RAMP_RESOURCE};

#[derive(Debug, Serialize)]
struct PhaseReport {
    status: FadeStatus,
    steps: u32,
}

#[derive(Debug, Serialize)]
struct CycleReport {
    range: (usize, usize),
    ticks: u32,
    steps: u32,
    cursor: usize,
}

#[derive(Debug, Serialize)]
struct SessionReport<'a> {
    width: usize,
    height: usize,
    palette_source: String,
    fade_in: PhaseReport,
    cycle: Option<CycleReport>,
    fade_out: Option<PhaseReport>,
    frames_presented: u64,
    event_polls: u32,
    palette_checksum: u32,
    events: &'a [DisplayEvent],
}

pub fn execute(args: SessionArgs) -> Result<()> {
    let SessionArgs {
        palette,
        screen_config,
        cycle_range,
        cycle_interval,
        cycle_ticks,
        quit_after,
        report_json,
        verbose,
    } = args;

    let config = ScreenConfig::from_json_file(screen_config.as_deref())
        .context("loading screen config")?;

    let (resources, (file, subfile), palette_source) = match &palette {
        PaletteSource::Container {
            ap_dir,
            file,
            subfile,
        } => (
            Rc::new(ContainerResources::open(ap_dir)?) as Rc<dyn ResourceLoader>,
            (*file, *subfile),
            format!("{}:{file}:{subfile}", ap_dir.display()),
        ),
        PaletteSource::GreyRamp => (
            Rc::new(grey_ramp_resources()) as Rc<dyn ResourceLoader>,
            GREY_RAMP_RESOURCE,
            "grey-ramp".to_string(),
        ),
    };

    let display = RecordingDisplay::new(config.width, config.height);
    let events = Rc::new(match quit_after {
        Some(polls) => ScriptedEvents::quit_after(polls),
        None => ScriptedEvents::new(),
    });
    let ctx = EngineContext::new(Rc::new(display.clone()), resources, events.clone());
    let mut timers = TimerTable::new(config.timer_slots);
    let (width, height) = (config.width, config.height);
    let mut screen = Screen::new(ctx, config)?;

    screen.set_palette_span(0, PALETTE_COUNT)?;
    screen
        .load_palette(file, subfile)
        .with_context(|| format!("loading palette from {palette_source}"))?;
    info!("palette loaded from {palette_source}");

    draw_test_card(&mut screen, cycle_range);
    screen.update_screen();

    let fade_in = run_fade(&mut screen, &*events, false);
    info!("fade in {:?} after {} steps", fade_in.status, fade_in.steps);

    let mut cycle = None;
    let mut fade_out = None;
    if fade_in.status == FadeStatus::Finished {
        let report = run_cycle(
            &mut screen,
            &mut timers,
            &*events,
            cycle_range,
            cycle_interval,
            cycle_ticks,
        );
        info!(
            "cycled {}..{} for {} steps",
            cycle_range.0, cycle_range.1, report.steps
        );
        let quit = events.should_quit();
        cycle = Some(report);

        if !quit {
            let report = run_fade(&mut screen, &*events, true);
            info!("fade out {:?} after {} steps", report.status, report.steps);
            fade_out = Some(report);
        }
    }

    let recorded = display.events();
    let palette_checksum = display
        .palette()
        .iter()
        .fold(0u32, |sum, &channel| sum.wrapping_add(u32::from(channel)));

    println!(
        "Session finished: {} frame(s) presented, {} display call(s), palette checksum {}",
        screen.frames_presented(),
        recorded.len(),
        palette_checksum
    );
    if verbose {
        for event in &recorded {
            println!("  {event:?}");
        }
    }

    if let Some(path) = report_json.as_deref() {
        let report = SessionReport {
            width,
            height,
            palette_source,
            fade_in,
            cycle,
            fade_out,
            frames_presented: screen.frames_presented(),
            event_polls: events.polls(),
            palette_checksum,
            events: &recorded,
        };
        write_report(path, &report)?;
        println!("Session report written to {}", path.display());
    }

    Ok(())
}

/// Background plus a row of swatches in the cycled colours.
fn draw_test_card(screen: &mut Screen, (start, end): (usize, usize)) {
    screen.clear_screen();

    let width = screen.surface().width() as i32;
    let height = screen.surface().height() as i32;
    screen.draw_box(Rect::new(0, 0, width, height), 1);

    // Screens too small for the inset frame only get the background.
    let frame = Rect::new(4, 4, width - 4, height - 4);
    if frame.is_empty() {
        return;
    }
    screen.draw_rect(frame, 15);

    let count = (end - start) as i32;
    let swatch = ((width - 16) / count).max(1);
    for (offset, color) in (start..end).enumerate() {
        let left = 8 + offset as i32 * swatch;
        let swatch_rect = Rect::new(left, height / 2 - 10, left + swatch, height / 2 + 10);
        if swatch_rect.right > width - 8 || swatch_rect.is_empty() {
            break;
        }
        screen.draw_box(swatch_rect, color as u8);
    }
}

/// Drives a fade one step per event poll until it settles.
fn run_fade(screen: &mut Screen, events: &dyn EventPump, out: bool) -> PhaseReport {
    if out {
        screen.begin_fade_out();
    } else {
        screen.begin_fade_in();
    }

    let mut steps = 0;
    loop {
        events.poll_events_and_wait();
        let status = screen.advance_fade();
        if status == FadeStatus::Running || status == FadeStatus::Finished {
            steps += 1;
        }
        if status != FadeStatus::Running {
            return PhaseReport { status, steps };
        }
    }
}

fn run_cycle(
    screen: &mut Screen,
    timers: &mut TimerTable,
    events: &dyn EventPump,
    (start, end): (usize, usize),
    interval: u32,
    ticks: u32,
) -> CycleReport {
    screen.set_palette_cycle(timers, start, end, interval);

    let mut steps = 0;
    let mut elapsed = 0;
    while elapsed < ticks {
        events.poll_events_and_wait();
        if events.should_quit() {
            debug!("quit requested during palette cycling");
            break;
        }
        timers.update();
        if screen.cycle_palette_backwards(timers) {
            steps += 1;
        }
        elapsed += 1;
    }

    CycleReport {
        range: (start, end),
        ticks: elapsed,
        steps,
        cursor: screen.palette_cycle().cursor(),
    }
}

fn write_report(path: &Path, report: &SessionReport<'_>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(report).context("serializing session report")?;
    fs::write(path, json)
        .with_context(|| format!("writing session report to {}", path.display()))?;
    Ok(())
}
