//! Read-only commands: `apps` and `describe`.

use spectrum_core::CommandExecutor;

use crate::error::PipelineError;
use crate::options::OptionInputs;
use crate::orchestrator::Orchestrator;

impl<E: CommandExecutor> Orchestrator<E> {
    /// Display lines for every stack spectrum deployed.
    pub async fn list_apps(&self, options: &OptionInputs) -> Result<Vec<String>, PipelineError> {
        let creds = self.assume_role(options).await?;
        Ok(self.aws().list_stacks(&creds, None).await?)
    }

    /// Raw stack description of one deployed app.
    pub async fn describe_app(
        &self,
        options: &OptionInputs,
        app: &str,
    ) -> Result<String, PipelineError> {
        if app.trim().is_empty() {
            return Err(PipelineError::MissingArgument("app"));
        }
        let creds = self.assume_role(options).await?;
        Ok(self.aws().describe_stack(&creds, app).await?)
    }
}
