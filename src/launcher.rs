/*
MIT License

Copyright (c) 2021, 2022, 2024, 2025 Vincent Hiribarren

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

use log::info;
use pollster::FutureExt;
use std::env;

use crate::{
    config::PlaygroundConfig,
    draw_context::DrawContext,
    render_loop::{LaunchContext, RenderContext, RenderLoopBuilder, RenderLoopHandler, TimeInfo},
    window::run_event_loop,
};

const GLOBAL_LOG_FILTER: log::LevelFilter = log::LevelFilter::Info;
const ENV_HEADLESS: &str = "HEADLESS";

pub fn launch_app<F>(config: PlaygroundConfig, builder: F) -> anyhow::Result<()>
where
    F: Fn(LaunchContext) -> anyhow::Result<Box<dyn RenderLoopHandler>> + 'static,
{
    init_log()?;
    info!("Init app");
    let is_headless = config.headless || env::var(ENV_HEADLESS).is_ok();
    if is_headless {
        info!("Running in headless mode");
        init_headless(&config, &builder)
    } else {
        run_event_loop(config, Box::new(builder))
    }
}

fn init_log() -> anyhow::Result<()> {
    use fern::colors::{Color, ColoredLevelConfig};
    let colors = ColoredLevelConfig::new()
        .info(Color::Blue)
        .debug(Color::Green);
    fern::Dispatch::new()
        .level(GLOBAL_LOG_FILTER)
        .level_for(env!("CARGO_CRATE_NAME"), log::LevelFilter::Debug)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}:{}] {}",
                chrono::Local::now().format("[%H:%M:%S]"),
                colors.color(record.level()),
                record.target(),
                record.line().unwrap_or_default(),
                message
            ));
        })
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn init_headless(config: &PlaygroundConfig, builder: &RenderLoopBuilder) -> anyhow::Result<()> {
    let mut draw_context =
        DrawContext::new(None, config.dimensions(), config.backend.backends()).block_on()?;
    let mut handler = builder(LaunchContext {
        draw_context: &mut draw_context,
        config,
    })?;
    let mut time_info = TimeInfo::default();
    time_info.tick();
    let render_context = RenderContext {
        time_info: &time_info,
        draw_context: &draw_context,
    };
    handler.on_update(&render_context);
    draw_context.draw_frame(|pass| handler.on_render(&render_context, pass))?;
    info!("Headless frame rendered");
    Ok(())
}
