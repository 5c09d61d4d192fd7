fn main() -> anyhow::Result<()> {
    // With the embedded model, Python multiprocessing may re-launch this
    // binary as a worker; exit before building the runtime.
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a.contains("multiprocessing"))
        || std::env::var("_PYTHON_MULTIPROCESSING_WORKER").is_ok()
    {
        return Ok(());
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(api_server::run_server())
}
