//! The built-in shell commands, grounded on `commands.cpp` (`cmd_*`) and
//! `terminal.cpp`'s `help_command`. `fire` and `hsb` have no counterpart
//! in the original source; they're implemented fresh in the same
//! command-function shape as the others, per spec.

use super::{CommandContext, Registry};
use crate::animations::{FireParams, FireTask, RainbowParams, RainbowTask, TwinkleTask};
use crate::color;
use crate::tty;
use std::time::Duration;

pub fn register_builtins(registry: &Registry) {
    registry.register("help", cmd_help);
    registry.register("print_args", cmd_print_args);
    registry.register("tasks", cmd_tasks);
    registry.register("kill", cmd_kill);
    registry.register("exit", cmd_exit);
    registry.register("quit", cmd_exit);
    registry.register("reset", cmd_reset);
    registry.register("clear", cmd_clear);
    registry.register("stop", cmd_stop);
    registry.register("rgb", cmd_rgb);
    registry.register("hsb", cmd_hsb);
    registry.register("rainbow", cmd_rainbow);
    registry.register("twinkle", cmd_twinkle);
    registry.register("fire", cmd_fire);
}

fn cmd_help(ctx: &CommandContext, _args: &[String]) -> i32 {
    let tty = ctx.scheduler.current_tty();
    tty::println(&tty, "Commands:");
    for name in ctx.registry.names() {
        tty::println(&tty, &format!("  {name}"));
    }
    0
}

fn cmd_print_args(ctx: &CommandContext, args: &[String]) -> i32 {
    let tty = ctx.scheduler.current_tty();
    tty::println(&tty, &format!("received {} arguments", args.len()));
    for (i, a) in args.iter().enumerate() {
        tty::println(&tty, &format!("{i}: '{a}'"));
    }
    0
}

fn cmd_tasks(ctx: &CommandContext, _args: &[String]) -> i32 {
    let tty = ctx.scheduler.current_tty();
    let snapshot = ctx.scheduler.snapshot();
    if snapshot.is_empty() {
        tty::println(&tty, "(none)");
    } else {
        for t in &snapshot {
            let mut line = format!("{}. {} (", t.tid, t.name);
            if t.active {
                line.push('a');
            }
            if t.background {
                line.push('b');
            }
            if t.waits {
                line.push('w');
            }
            line.push(')');
            if let Some(parent) = t.parent {
                line.push_str(&format!("[{parent}]"));
            }
            if t.interval > 0 {
                line.push_str(&format!(" (every {} us", t.interval));
                if t.active {
                    line.push_str(&format!("; scheduled for {})", t.scheduled));
                } else {
                    line.push(')');
                }
            }
            let connected = t.tty.borrow().connected();
            line.push_str(&format!(" (tty {:p}", t.tty));
            if !connected {
                line.push_str(" disconnected");
            }
            line.push(')');
            line.push_str(&format!(" (runtime {} ms", t.ms_cost * 1000 / 1024));
            if t.interval > 0 {
                line.push_str(&format!("; late {} ms", t.ms_late * 1000 / 1024));
            }
            line.push(')');
            tty::println(&tty, &line);
        }
        tty::println(&tty, "a=active, b=background, w=waits. [parent]");
    }
    tty::println(&tty, &format!("Current time: {} us", ctx.clock().now_us()));
    0
}

fn cmd_kill(ctx: &CommandContext, args: &[String]) -> i32 {
    let tty = ctx.scheduler.current_tty();
    if args.len() < 2 {
        tty::println(&tty, &format!("Usage: {} [-c exitcode] tid tid ...", args.first().map(String::as_str).unwrap_or("kill")));
        return 1;
    }
    let mut exitcode: u8 = 22;
    let mut i = 1;
    while i < args.len() {
        if args[i] == "-c" {
            i += 1;
            if i < args.len() {
                exitcode = args[i].parse().unwrap_or(0);
            }
        } else if let Ok(tid) = args[i].parse::<u8>() {
            if ctx.scheduler.is_alive(tid) {
                tty::println(&tty, &format!("Killing task {tid} with code {exitcode}"));
                ctx.scheduler.exit(tid, exitcode);
            }
        }
        i += 1;
    }
    0
}

fn cmd_exit(ctx: &CommandContext, _args: &[String]) -> i32 {
    let tty = ctx.scheduler.current_tty();
    tty::println(&tty, "Bye!");
    tty.borrow_mut().close();
    0
}

fn cmd_reset(ctx: &CommandContext, _args: &[String]) -> i32 {
    let tty = ctx.scheduler.current_tty();
    tty::println(&tty, "Resetting.");
    tty.borrow_mut().close();
    std::thread::sleep(Duration::from_millis(5));
    log::warn!("reset command invoked, exiting process");
    std::process::exit(0);
}

fn cmd_clear(ctx: &CommandContext, _args: &[String]) -> i32 {
    let mut seg = ctx.leds.request_segment();
    seg.clear();
    seg.send(true);
    0
}

fn cmd_stop(ctx: &CommandContext, _args: &[String]) -> i32 {
    let _seg = ctx.leds.request_segment();
    0
}

fn cmd_rgb(ctx: &CommandContext, args: &[String]) -> i32 {
    let tty = ctx.scheduler.current_tty();
    if args.len() != 4 {
        tty::println(&tty, &format!("{} r g b", args.first().map(String::as_str).unwrap_or("rgb")));
        return 1;
    }
    let r = color::clamp01(args[1].parse().unwrap_or(0.0));
    let g = color::clamp01(args[2].parse().unwrap_or(0.0));
    let b = color::clamp01(args[3].parse().unwrap_or(0.0));
    let mut seg = ctx.leds.request_segment();
    let triple = ((r * 255.99) as u8, (g * 255.99) as u8, (b * 255.99) as u8);
    for i in 0..seg.length() {
        seg.set(i, triple);
    }
    seg.send(true);
    0
}

/// `Err` carries the usage line to print. Pulled out of `cmd_hsb` so the
/// parsing can be exercised directly in tests without a `CommandContext`.
fn parse_hsb_args(args: &[String]) -> Result<(f32, f32, f32), String> {
    if args.len() != 4 {
        return Err(format!("{} h s b", args.first().map(String::as_str).unwrap_or("hsb")));
    }
    let h: f32 = args[1].parse().unwrap_or(0.0);
    let s: f32 = args[2].parse().unwrap_or(1.0);
    let b: f32 = args[3].parse().unwrap_or(1.0);
    Ok((h, s, b))
}

fn cmd_hsb(ctx: &CommandContext, args: &[String]) -> i32 {
    let tty = ctx.scheduler.current_tty();
    let (h, s, b) = match parse_hsb_args(args) {
        Ok(v) => v,
        Err(usage) => {
            tty::println(&tty, &usage);
            return 1;
        }
    };
    let (r, g, bl) = color::hsb_to_rgb(h, s, b);
    let mut seg = ctx.leds.request_segment();
    let triple = (color::to_u8(r), color::to_u8(g), color::to_u8(bl));
    for i in 0..seg.length() {
        seg.set(i, triple);
    }
    seg.send(true);
    0
}

/// Pulled out of `cmd_rainbow` for the same reason as `parse_hsb_args`.
fn parse_rainbow_args(args: &[String]) -> Result<RainbowParams, String> {
    let mut params = RainbowParams::default();
    let mut i = 1;
    while i < args.len() {
        let consume_f32 = |i: &mut usize, args: &[String], default: f32| -> f32 {
            *i += 1;
            args.get(*i).and_then(|s| s.parse().ok()).unwrap_or(default)
        };
        match args[i].as_str() {
            "-f" => params.speed = consume_f32(&mut i, args, params.speed),
            "-m" => params.mul = consume_f32(&mut i, args, params.mul),
            "-s" => params.saturation = color::clamp01(consume_f32(&mut i, args, params.saturation)),
            "-b" => params.brightness = color::clamp01(consume_f32(&mut i, args, params.brightness)),
            _ => {
                return Err(format!(
                    "{} [-f speed] [-m spatial_multiplier] [-s saturation] [-b brightness]",
                    args[0]
                ));
            }
        }
        i += 1;
    }
    Ok(params)
}

fn cmd_rainbow(ctx: &CommandContext, args: &[String]) -> i32 {
    let tty = ctx.scheduler.current_tty();
    let params = match parse_rainbow_args(args) {
        Ok(p) => p,
        Err(usage) => {
            tty::println(&tty, &usage);
            return 1;
        }
    };
    let seg = ctx.leds.request_segment();
    let tid = ctx.scheduler.spawn("rainbow", Box::new(RainbowTask::new(seg, params)));
    ctx.scheduler.detach(tid);
    ctx.scheduler.set_interval_fps(tid, 30.0);
    ctx.scheduler.set_active(tid, true);
    0
}

fn cmd_twinkle(ctx: &CommandContext, _args: &[String]) -> i32 {
    let seg = ctx.leds.request_segment();
    let tid = ctx.scheduler.spawn("twinkle", Box::new(TwinkleTask::new(seg)));
    ctx.scheduler.detach(tid);
    ctx.scheduler.set_interval_fps(tid, 30.0);
    ctx.scheduler.set_active(tid, true);
    0
}

/// Pulled out of `cmd_fire` for the same reason as `parse_hsb_args`.
fn parse_fire_args(args: &[String]) -> Result<FireParams, String> {
    let mut params = FireParams::default();
    let mut i = 1;
    while i < args.len() {
        let consume_f32 = |i: &mut usize, args: &[String], default: f32| -> f32 {
            *i += 1;
            args.get(*i).and_then(|s| s.parse().ok()).unwrap_or(default)
        };
        match args[i].as_str() {
            "-r" => {
                i += 1;
                let rows: u32 = args.get(i).and_then(|s| s.parse().ok()).unwrap_or(params.rows as u32);
                params.rows = rows.clamp(2, 25) as u8;
            }
            "-d" => params.decay = color::clamp01(consume_f32(&mut i, args, params.decay)),
            "-e" => params.heat = color::clamp01(consume_f32(&mut i, args, params.heat)),
            "-l" => params.loss = consume_f32(&mut i, args, params.loss).max(1.0),
            "-k" => params.keep = color::clamp01(consume_f32(&mut i, args, params.keep)),
            "-f" => params.fps = consume_f32(&mut i, args, params.fps),
            _ => {
                return Err(format!(
                    "{} [-r rows 2..25] [-d decay] [-e heat] [-l loss >=1] [-k keep] [-f fps]",
                    args[0]
                ));
            }
        }
        i += 1;
    }
    Ok(params)
}

fn cmd_fire(ctx: &CommandContext, args: &[String]) -> i32 {
    let tty = ctx.scheduler.current_tty();
    let params = match parse_fire_args(args) {
        Ok(p) => p,
        Err(usage) => {
            tty::println(&tty, &usage);
            return 1;
        }
    };
    let seg = ctx.leds.request_segment();
    let fps = params.fps;
    let tid = ctx.scheduler.spawn("fire", Box::new(FireTask::new(seg, params)));
    ctx.scheduler.detach(tid);
    ctx.scheduler.set_interval_fps(tid, fps);
    ctx.scheduler.set_active(tid, true);
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::led::{LedSystem, NullDmaSink};
    use crate::task::{Scheduler, TaskBehavior, Tid};
    use crate::tty::{MemoryTty, TtyHandle};

    struct NoOp;
    impl TaskBehavior for NoOp {
        fn run(&mut self, _sched: &Scheduler, _tid: Tid) {}
    }

    fn context() -> (CommandContext, TtyHandle) {
        let mem = MemoryTty::new().handle();
        let sched = Scheduler::new(Clock::new(), mem.clone());
        let leds = LedSystem::new(4, Box::new(NullDmaSink::new()));
        let registry = Registry::new();
        register_builtins(&registry);
        (CommandContext { scheduler: sched, leds, registry }, mem)
    }

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    fn output(mem: &TtyHandle) -> String {
        String::from_utf8_lossy(&mem.borrow_mut().take_output()).into_owned()
    }

    #[test]
    fn tasks_with_no_tasks_reports_none_and_current_time() {
        let (ctx, mem) = context();
        let code = cmd_tasks(&ctx, &args(&["tasks"]));
        assert_eq!(code, 0);
        let out = output(&mem);
        assert!(out.contains("(none)"));
        assert!(out.contains("Current time:"));
    }

    #[test]
    fn tasks_formats_flags_interval_and_runtime() {
        let (ctx, mem) = context();
        let tid = ctx.scheduler.spawn("beacon", Box::new(NoOp));
        ctx.scheduler.set_active(tid, true);
        ctx.scheduler.set_background(tid, true);
        ctx.scheduler.set_interval(tid, 1_000_000);
        output(&mem);

        let code = cmd_tasks(&ctx, &args(&["tasks"]));
        assert_eq!(code, 0);
        let out = output(&mem);
        assert!(out.contains(&format!("{tid}. beacon (abw)")), "{out}");
        assert!(out.contains("every 1000000 us"), "{out}");
        assert!(out.contains("scheduled for"), "{out}");
        assert!(out.contains("runtime"), "{out}");
        assert!(out.contains("a=active, b=background, w=waits. [parent]"), "{out}");
    }

    #[test]
    fn print_args_echoes_each_argument_with_its_index() {
        let (ctx, mem) = context();
        cmd_print_args(&ctx, &args(&["print_args", "one", "two"]));
        let out = output(&mem);
        assert!(out.contains("received 3 arguments"));
        assert!(out.contains("1: 'one'"));
        assert!(out.contains("2: 'two'"));
    }

    #[test]
    fn kill_with_too_few_args_reports_usage_and_errors() {
        let (ctx, mem) = context();
        let code = cmd_kill(&ctx, &args(&["kill"]));
        assert_eq!(code, 1);
        assert!(output(&mem).contains("Usage:"));
    }

    #[test]
    fn kill_with_trailing_flag_and_no_value_does_not_panic() {
        let (ctx, _mem) = context();
        let tid = ctx.scheduler.spawn("t", Box::new(NoOp));
        let code = cmd_kill(&ctx, &args(&["kill", "-c"]));
        assert_eq!(code, 0);
        assert!(ctx.scheduler.is_alive(tid), "no tid argument was given, nothing should be killed");
    }

    #[test]
    fn rgb_with_wrong_argument_count_reports_usage_and_errors() {
        let (ctx, mem) = context();
        let code = cmd_rgb(&ctx, &args(&["rgb", "1", "0"]));
        assert_eq!(code, 1);
        assert!(output(&mem).contains("rgb r g b"));
    }

    #[test]
    fn hsb_with_wrong_argument_count_reports_usage_and_errors() {
        let (ctx, mem) = context();
        let code = cmd_hsb(&ctx, &args(&["hsb", "120", "1"]));
        assert_eq!(code, 1);
        assert!(output(&mem).contains("hsb h s b"));
    }

    #[test]
    fn hsb_parses_hue_saturation_and_brightness() {
        let (h, s, b) = parse_hsb_args(&args(&["hsb", "120", "0.5", "0.75"])).unwrap();
        assert_eq!(h, 120.0);
        assert_eq!(s, 0.5);
        assert_eq!(b, 0.75);
    }

    #[test]
    fn hsb_unparsable_numbers_fall_back_to_full_saturation_and_brightness() {
        let (h, s, b) = parse_hsb_args(&args(&["hsb", "nope", "nope", "nope"])).unwrap();
        assert_eq!(h, 0.0);
        assert_eq!(s, 1.0);
        assert_eq!(b, 1.0);
    }

    #[test]
    fn rainbow_with_unknown_flag_reports_usage_and_errors() {
        let (ctx, mem) = context();
        let code = cmd_rainbow(&ctx, &args(&["rainbow", "-z"]));
        assert_eq!(code, 1);
        assert!(output(&mem).contains("[-f speed]"));
    }

    #[test]
    fn fire_clamps_rows_above_range_down_to_twenty_five() {
        let params = parse_fire_args(&args(&["fire", "-r", "99"])).unwrap();
        assert_eq!(params.rows, 25);
    }

    #[test]
    fn fire_clamps_rows_below_range_up_to_two() {
        let params = parse_fire_args(&args(&["fire", "-r", "0"])).unwrap();
        assert_eq!(params.rows, 2);
    }

    #[test]
    fn fire_clamps_loss_up_to_minimum_of_one() {
        let params = parse_fire_args(&args(&["fire", "-l", "0.1"])).unwrap();
        assert_eq!(params.loss, 1.0);
    }

    #[test]
    fn fire_with_unknown_flag_reports_usage_and_errors() {
        let (ctx, mem) = context();
        let code = cmd_fire(&ctx, &args(&["fire", "-z"]));
        assert_eq!(code, 1);
        assert!(output(&mem).contains("[-r rows 2..25]"));
    }
}
