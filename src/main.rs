fn main() -> std::process::ExitCode {
    tor_router_lib::run()
}
