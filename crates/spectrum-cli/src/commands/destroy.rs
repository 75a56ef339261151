use spectrum_pipeline::{EnvSnapshot, OptionInputs, Target, TerminalReporter};

/// Tear down the stack, registry and DNS record of a deployment.
pub async fn destroy(
    target: Target,
    options: &OptionInputs,
    env: EnvSnapshot,
) -> anyhow::Result<()> {
    let orchestrator = super::load_orchestrator(env)?;

    let outcome = orchestrator
        .destroy(&target, options, Box::new(TerminalReporter::new("Destroy")))
        .await?;

    println!();
    match &outcome.stack {
        Some(stack) => println!("  Stack deletion submitted: {stack}"),
        None => println!("  No stack found for {}", outcome.resource),
    }
    println!("  DNS record removed:      {}", outcome.record_name);

    Ok(())
}
