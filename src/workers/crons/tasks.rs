/// Runs each task against `$ctx` in order and evaluates to the number of
/// tasks that returned an error. A failing task never stops the ones after it.
#[macro_export]
macro_rules! cron_tasks {
    ($ctx:expr, $($t:path),* $(,)?) => {{
        let mut failed_tasks = 0usize;
        $({
            const TASK_NAME: &str = const_str::convert_ascii_case!(upper_camel, stringify!($t));
            let now = std::time::Instant::now();
            tracing::info!(task = TASK_NAME, "Starting task");
            match ($t)($ctx).await {
                Ok(v) => tracing::info!(
                    task = TASK_NAME,
                    elapsed = ?now.elapsed(),
                    "Completed task with result {v:?}"
                ),
                Err(e) => {
                    failed_tasks += 1;
                    tracing::error!(task = TASK_NAME, "Task failed: {e:?}");
                }
            }
        })*
        failed_tasks
    }};
}
