mod cucumber;
mod support;

use ::cucumber::{codegen::LocalBoxFuture, event::ScenarioFinished, gherkin, writer, World};
use futures_util::FutureExt;
use log::*;
use tokio::runtime::Runtime;

use crate::cucumber::SyncWorld;

fn main() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let sys = Runtime::new().unwrap();
    sys.block_on(
        SyncWorld::cucumber()
            .with_writer(writer::Libtest::or_basic())
            .after(|_f, _r, scenario, ev, w| post_test_hook(scenario, ev, w))
            .run("tests/features"),
    );
    info!("🚀️ Tests complete");
}

fn post_test_hook<'a>(
    scenario: &'a gherkin::Scenario,
    ev: &'a ScenarioFinished,
    world: Option<&'a mut SyncWorld>,
) -> LocalBoxFuture<'a, ()> {
    let fut = async move {
        trace!("🚀️ After-scenario hook running for \"{}\"", scenario.name);
        match world.and_then(|w| w.system.take()) {
            Some(sys) => {
                if let ScenarioFinished::StepFailed(_, _, _) = ev {
                    error!("🚀️ Error in scenario \"{}\"", scenario.name);
                }
                sys.engine.shutdown();
            },
            None => trace!("🚀️ No sync engine to shut down"),
        }
        trace!("🚀️ After-scenario hook complete");
    };
    fut.boxed_local()
}
