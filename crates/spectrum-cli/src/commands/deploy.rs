use spectrum_pipeline::{EnvSnapshot, OptionInputs, Target, TerminalReporter};

/// Build, publish and deploy the primary application or a branch.
pub async fn deploy(
    target: Target,
    options: &OptionInputs,
    env: EnvSnapshot,
) -> anyhow::Result<()> {
    let orchestrator = super::load_orchestrator(env)?;
    let scope = match target {
        Target::Primary => "AWS CloudFormation Deployment",
        Target::Branch(_) => "[Branch] Deployment",
    };

    let outcome = orchestrator
        .deploy(&target, options, Box::new(TerminalReporter::new(scope)))
        .await?;

    println!();
    println!("  Application: {}", outcome.resource);
    println!("  Stack:       {}", outcome.stack);
    println!("  Image:       {}", outcome.image);
    if let Some(environment) = &outcome.environment {
        println!("  Environment: {environment}");
    }
    println!("  URL:         {}", outcome.url());
    println!();
    println!("Stack creation continues in CloudFormation; check progress with:");
    println!("  spectrum describe {}", outcome.stack);

    Ok(())
}
