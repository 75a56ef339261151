use spectrum_pipeline::{EnvSnapshot, OptionInputs};

/// List every stack spectrum deployed in the configured account.
pub async fn apps(options: &OptionInputs, env: EnvSnapshot) -> anyhow::Result<()> {
    let orchestrator = super::load_orchestrator(env)?;
    let stacks = orchestrator.list_apps(options).await?;

    if stacks.is_empty() {
        println!("No applications deployed.");
    }
    for line in &stacks {
        println!("{line}");
    }
    Ok(())
}

/// Print the stack description of one application.
pub async fn describe(
    options: &OptionInputs,
    env: EnvSnapshot,
    app: &str,
) -> anyhow::Result<()> {
    let orchestrator = super::load_orchestrator(env)?;
    let description = orchestrator.describe_app(options, app).await?;
    println!("{}", description.trim_end());
    Ok(())
}
