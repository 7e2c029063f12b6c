//! gdb-pilot binary entry point: the interactive menu shell.
//!
//! A thin stdin-driven menu mapping user commands one-to-one onto the
//! controller and toolchain operations. All session logic lives in the
//! library.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gdb_pilot::config::Config;
use gdb_pilot::{cli, logging, AutoHandler, Compiler, DebugController, ManualHandler, ToolOutput};
use tracing::info;

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    logging::init_with_filter(&log_directive(config.log_filter()));
    info!("gdb-pilot v{}", env!("CARGO_PKG_VERSION"));

    Menu::new(&config).run()
}

/// Scope a bare level to this crate; pass full directives through.
fn log_directive(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("gdb_pilot={level}")
    }
}

/// The interactive command menu.
struct Menu {
    controller: DebugController,
    compiler: Compiler,
}

impl Menu {
    fn new(config: &Config) -> Self {
        let mut controller = DebugController::new(config.tools.gdb.clone());
        controller.set_echo(config.debugger.echo_output);
        Self {
            controller,
            compiler: Compiler::new(config.tools.gcc.clone()),
        }
    }

    fn run(&mut self) -> ExitCode {
        println!("Welcome to gdb-pilot!");
        print_menu();

        let stdin = io::stdin();
        loop {
            println!();
            let mut line = String::new();
            match stdin.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {}
                Err(err) => {
                    eprintln!("error reading input: {err}");
                    break;
                }
            }

            let (option, rest) = split_command(&line);
            match option {
                "" => {}
                "0" | "help" => print_menu(),
                "1" | "init" => self.init(rest),
                "1.1" | "gdb" => self.set_gdb(rest),
                "1.2" | "gcc" => self.set_gcc(rest),
                "2" | "test" => self.test(),
                "3" | "comp" => self.comp(rest),
                "3.1" | "compile" => self.compile(rest),
                "4" | "load" => self.load(rest),
                "5" | "start" => self.start(),
                "6" | "break" => self.set_breakpoint(rest),
                "7" | "handle" => self.handle(rest),
                "8" | "output" => self.output(rest),
                "9" | "reset" => self.reset(),
                "10" | "quit" => break,
                _ => println!("Invalid option. Please try again or type 'help'."),
            }
        }

        ExitCode::SUCCESS
    }

    fn init(&mut self, rest: &str) {
        if rest.is_empty() {
            println!("The path cannot be empty. Please try again.");
            return;
        }
        let dir = Path::new(rest);
        self.controller.set_gdb_path(tool_in_dir(dir, "gdb"));
        self.compiler.set_gcc_path(tool_in_dir(dir, "gcc"));
        println!("Toolchain folder set to {rest}");
    }

    fn set_gdb(&mut self, rest: &str) {
        if rest.is_empty() {
            println!("The path cannot be empty. Please try again.");
            return;
        }
        self.controller.set_gdb_path(rest);
        println!("GDB path set to {rest}");
    }

    fn set_gcc(&mut self, rest: &str) {
        if rest.is_empty() {
            println!("The path cannot be empty. Please try again.");
            return;
        }
        self.compiler.set_gcc_path(rest);
        println!("GCC path set to {rest}");
    }

    fn test(&mut self) {
        println!("Testing GDB and GCC versions...");
        report_probe("GDB", self.controller.probe_version());
        report_probe("GCC", self.compiler.probe_version());
        println!("Test complete.");
    }

    fn comp(&mut self, rest: &str) {
        if rest.is_empty() {
            println!("The path cannot be empty. Please try again.");
            return;
        }
        println!("Compiling {rest}...");
        match self.compiler.compile(rest) {
            Ok(output) => println!("Successfully compiled to {output}"),
            Err(err) => println!("{err}"),
        }
    }

    fn compile(&mut self, rest: &str) {
        let args: Vec<&str> = rest.split_whitespace().collect();
        if args.len() != 2 {
            println!("Please provide the source and destination file paths.");
            return;
        }
        println!("Compiling {} to {}...", args[0], args[1]);
        match self.compiler.compile_to(args[0], args[1]) {
            Ok(_) => println!("Successfully compiled to {}", args[1]),
            Err(err) => println!("{err}"),
        }
    }

    fn load(&mut self, rest: &str) {
        if rest.is_empty() {
            println!("The path cannot be empty. Please try again.");
            return;
        }
        self.controller.load(rest);
        println!("Loaded file {rest}");
    }

    fn start(&mut self) {
        println!("Debugging started...");
        match self.controller.start() {
            Ok(()) => println!("Debugging finished."),
            Err(err) => println!("{err}"),
        }
    }

    fn set_breakpoint(&mut self, rest: &str) {
        let args: Vec<&str> = rest.split_whitespace().collect();
        if args.len() != 2 {
            println!("Please provide the file name and line number.");
            return;
        }
        let line: u32 = match args[1].parse() {
            Ok(line) => line,
            Err(_) => {
                println!("The line number must be an integer.");
                return;
            }
        };
        self.controller.add_breakpoint(args[0], line);
        println!("Breakpoint set at {}:{}", args[0], line);
    }

    fn handle(&mut self, rest: &str) {
        match rest {
            "auto" => {
                self.controller.set_break_handler(Box::new(AutoHandler::new()));
                println!("Auto handler set.");
            }
            "manual" => {
                self.controller.set_break_handler(Box::new(ManualHandler::stdin()));
                println!("Manual handler set.");
            }
            _ => println!("Invalid handler. Please use 'auto' or 'manual'."),
        }
    }

    fn output(&mut self, rest: &str) {
        match rest {
            "on" => {
                self.controller.set_echo(true);
                println!("Output enabled.");
            }
            "off" => {
                self.controller.set_echo(false);
                println!("Output disabled.");
            }
            _ => println!("Invalid option. Please use 'on' or 'off'."),
        }
    }

    fn reset(&mut self) {
        self.controller.reset();
        println!("Debugger reset.");
    }
}

/// Split an input line into its command token and trimmed remainder.
fn split_command(line: &str) -> (&str, &str) {
    let trimmed = line.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((option, rest)) => (option, rest.trim()),
        None => (trimmed, ""),
    }
}

/// Resolve a tool executable inside a toolchain directory.
fn tool_in_dir(dir: &Path, tool: &str) -> PathBuf {
    dir.join(format!("{tool}{}", std::env::consts::EXE_SUFFIX))
}

fn report_probe(name: &str, result: gdb_pilot::Result<ToolOutput>) {
    match result {
        Ok(capture) => {
            print!("{}", capture.output);
            if capture.success() {
                println!("Successfully finished testing {name}!");
            } else {
                println!("testing {name} exited with non-zero status: {}", capture.code());
            }
        }
        Err(err) => println!("Error testing {name}: {err}"),
    }
}

fn print_menu() {
    println!(
        "To choose an option, type the number or the name of the option, optionally followed by the arguments
    0 - help = show this message
    1 - init <folderPath> = set the folder where the gdb and gcc executables are located
        1.1 - gdb <gdbPath> = set the GDB path (include the name of the executable)
        1.2 - gcc <gccPath> = set the GCC path (include the name of the executable)
    2 - test = check the GDB and GCC versions
    3 - comp <file.c> = compile a C file, the output path is derived from the source
        3.1 - compile <source.c> <destination> = compile a C file
    4 - load <filePath> = load a file to debug
    5 - start = start the debugger
    6 - break <fileName> <lineNumber> = set a breakpoint
    7 - handle auto|manual = set the breakpoint handler
            auto = print backtrace and resume
            manual = wait for user input
    8 - output on|off = show the debugger output
    9 - reset = reset the debugger
    10 - quit = exit the application"
    );
}
