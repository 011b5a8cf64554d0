//! The signed-in user's own profile.

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::render;

use super::Context;

pub async fn me(ctx: &Context, json: bool) -> Result<()> {
    let me = match ctx.session.fetch_identity().await {
        Ok(me) => me,
        Err(e) => {
            // Any failure here means the session cannot be trusted
            debug!(error = %e, "Identity fetch failed");
            ctx.session.invalidate();
            return Err(anyhow!(
                "Failed to load your profile. Run `rollcall login` to sign in again."
            ));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&me)?);
    } else {
        render::print_identity(&me);
        if me.is_admin() {
            println!();
            println!("Administrator tools: `rollcall users --help`");
        }
    }
    Ok(())
}
