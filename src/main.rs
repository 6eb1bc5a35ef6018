use buddhabrot::{
    config::{Backend, Config, Mode, Preset},
    presenter::Presenter,
    Engine,
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{error, info};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

const PRESET: &str = "preset";
const MODE: &str = "mode";
const BACKEND: &str = "backend";
const NO_SCANLINE: &str = "no-scanline";

fn command() -> Command {
    Command::new("wgpu-buddhabrot")
        .about("Real-time Buddhabrot renderer")
        .arg(
            Arg::new(PRESET)
                .long(PRESET)
                .short('p')
                .value_parser(|s: &str| s.parse::<Preset>())
                .default_value("classic")
                .help("Escape radius and budgets: classic (3, 512/1024/2048) or deep (2, 1024/2048/4096)"),
        )
        .arg(
            Arg::new(MODE)
                .long(MODE)
                .short('m')
                .value_parser(|s: &str| s.parse::<Mode>())
                .default_value("buddhabrot")
                .help("buddhabrot or mandelbrot"),
        )
        .arg(
            Arg::new(BACKEND)
                .long(BACKEND)
                .short('b')
                .value_parser(|s: &str| s.parse::<Backend>())
                .default_value("gpu")
                .help("Where trajectories are computed: scalar, threaded or gpu"),
        )
        .arg(
            Arg::new(NO_SCANLINE)
                .long(NO_SCANLINE)
                .action(ArgAction::SetTrue)
                .help("Don't mark the row being sampled"),
        )
}

fn config(matches: &ArgMatches) -> Config {
    let defaults = Config::default();
    Config {
        preset: matches
            .get_one::<Preset>(PRESET)
            .copied()
            .unwrap_or(defaults.preset),
        mode: matches.get_one::<Mode>(MODE).copied().unwrap_or(defaults.mode),
        backend: matches
            .get_one::<Backend>(BACKEND)
            .copied()
            .unwrap_or(defaults.backend),
        scanline: !matches.get_flag(NO_SCANLINE),
        ..defaults
    }
}

fn main() {
    env_logger::init();

    let config = config(&command().get_matches());
    info!("{:?}", config);

    let event_loop = EventLoop::new();
    let window = match WindowBuilder::new()
        .with_title(match config.mode {
            Mode::Buddhabrot => "Buddhabrot",
            Mode::Mandelbrot => "Mandelbrot",
        })
        .with_inner_size(PhysicalSize::new(config.size.width, config.size.height))
        .with_resizable(false)
        .build(&event_loop)
    {
        Ok(window) => window,
        Err(err) => {
            error!("failed to open window: {}", err);
            std::process::exit(1);
        }
    };

    let mut presenter = match Presenter::new(&window, config.size) {
        Ok(presenter) => presenter,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    let mut engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    event_loop.run(move |event, _, control_flow| match event {
        Event::MainEventsCleared => {
            window.request_redraw();
        }
        Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state: ElementState::Pressed,
                        virtual_keycode: Some(VirtualKeyCode::Escape),
                        ..
                    },
                ..
            } => {
                *control_flow = ControlFlow::Exit;
            }
            WindowEvent::Resized(size) => {
                presenter.resize(size);
            }
            _ => {}
        },
        Event::RedrawRequested(window_id) if window_id == window.id() => {
            let result = engine
                .step()
                .and_then(|(frame, _)| presenter.present(frame));
            if let Err(err) = result {
                error!("{}", err);
                *control_flow = ControlFlow::ExitWithCode(1);
            }
        }
        _ => {}
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, clap::Error> {
        command()
            .try_get_matches_from(args)
            .map(|matches| config(&matches))
    }

    #[test]
    fn defaults_sample_buddhabrot_on_the_gpu() {
        assert_eq!(parse(&["wgpu-buddhabrot"]).unwrap(), Config::default());
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "wgpu-buddhabrot",
            "--preset",
            "deep",
            "-m",
            "mandelbrot",
            "-b",
            "threaded",
            "--no-scanline",
        ])
        .unwrap();
        assert_eq!(config.preset, Preset::Deep);
        assert_eq!(config.mode, Mode::Mandelbrot);
        assert_eq!(config.backend, Backend::Threaded);
        assert!(!config.scanline);
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(parse(&["wgpu-buddhabrot", "--preset", "shallow"]).is_err());
        assert!(parse(&["wgpu-buddhabrot", "--backend", "cuda"]).is_err());
    }
}
