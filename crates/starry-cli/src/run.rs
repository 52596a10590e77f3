use anyhow::Result;
use serde_json::json;
use starry_core::api::forms::{
    parse_embed_fields, BanForm, EmbedForm, GuildForm, KickForm, MessageForm, PurgeForm, RoleForm,
    TicketActionForm, TimeoutForm,
};
use starry_core::filter::{FilterQuery, StatusFilter};
use starry_core::models::{LiveUser, RecordId};
use starry_core::secure_storage::SecureStorage;
use starry_core::streaming::{FeedOutcome, FeedState};
use starry_core::{Action, BlobKind, ConsoleConfig, ConsoleRuntime, Credential, Handled};

use crate::output::Output;
use crate::{read_input, ApplicationsCommand, Cli, Commands, SettingsCommand, UsersCommand};

pub fn login(token: Option<String>, cookie: Option<String>) -> Result<()> {
    let credential = match (token, cookie) {
        (Some(token), _) if !token.trim().is_empty() => Credential::Bearer(token.trim().to_string()),
        (_, Some(cookie)) if !cookie.trim().is_empty() => {
            Credential::SessionCookie(cookie.trim().to_string())
        }
        _ => anyhow::bail!("Credential must not be empty"),
    };
    SecureStorage::store_credential(&credential)?;
    eprintln!("Credential stored in the OS keyring");
    Ok(())
}

/// Run one console command. `--guild` is remembered like a selection in
/// the dashboard. Returns false when an error notice was raised.
pub async fn run(cli: Cli, config: ConsoleConfig) -> Result<bool> {
    let mut rt = ConsoleRuntime::from_config(&config)?;
    let mut out = Output::new(cli.pretty);

    if let Some(guild) = cli.guild.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
        rt.state_mut().session.select_guild(RecordId::from(guild));
    }

    match cli.command {
        // Handled before the runtime starts
        Commands::Login { .. } | Commands::Logout => {}

        Commands::Me => {
            load(&mut rt, [Action::LoadAccount]).await;
            let session = &rt.state().session;
            if let Some(user) = session.user() {
                out.print(&json!({
                    "user": user,
                    "guilds": session.guilds(),
                    "selectedGuild": session.selected_guild(),
                }))?;
            }
        }

        Commands::Summary { global: true } => {
            load(&mut rt, [Action::RefreshGlobalSummary]).await;
            out.print_unless_failed(rt.state(), &rt.state().global_summary)?;
        }
        Commands::Summary { global: false } => {
            load(&mut rt, [Action::RefreshGuildSummary]).await;
            out.print_unless_failed(rt.state(), &rt.state().current_guild_summary())?;
        }

        Commands::Tickets { search, status } => {
            let query = FilterQuery::new(search, StatusFilter::parse(&status));
            load(&mut rt, [Action::SetTicketQuery(query), Action::ReloadTickets]).await;
            out.print_unless_failed(rt.state(), &rt.state().store.visible_tickets())?;
        }
        Commands::TicketAction {
            thread,
            actor,
            action,
            user,
            reason,
        } => {
            let form = GuildForm::TicketAction(TicketActionForm {
                thread_id: thread,
                actor_id: actor,
                user_id: user,
                action,
                reason,
            });
            load(&mut rt, [Action::SubmitForm(form)]).await;
        }

        Commands::Applications { command } => match command {
            ApplicationsCommand::List { search, status } => {
                let query = FilterQuery::new(search, StatusFilter::parse(&status));
                load(
                    &mut rt,
                    [Action::SetApplicationQuery(query), Action::ReloadApplicationList],
                )
                .await;
                out.print_unless_failed(rt.state(), &rt.state().store.visible_applications())?;
            }
            ApplicationsCommand::Config => {
                load(&mut rt, [Action::ReloadApplicationsConfig]).await;
                out.print_unless_failed(rt.state(), &rt.state().blob(BlobKind::ApplicationsConfig))?;
            }
            ApplicationsCommand::Save { file } => {
                let text = read_input(&file)?;
                load(&mut rt, [Action::SaveApplicationsConfig(text)]).await;
            }
        },

        Commands::Settings { command } => match command {
            SettingsCommand::Get => {
                load(&mut rt, [Action::ReloadOverrides]).await;
                out.print_unless_failed(rt.state(), &rt.state().blob(BlobKind::Overrides))?;
            }
            SettingsCommand::Save { file } => {
                let text = read_input(&file)?;
                load(&mut rt, [Action::SaveOverrides(text)]).await;
            }
            SettingsCommand::Prettify { file } => {
                let text = read_input(&file)?;
                rt.dispatch(Action::PrettifyOverrides(text));
                if !rt.state().notifications.has_errors() {
                    if let Some(draft) = rt.state().draft(BlobKind::Overrides) {
                        println!("{}", draft);
                    }
                }
            }
        },

        Commands::Snippets => {
            load(&mut rt, [Action::ReloadOverrides]).await;
            out.print_unless_failed(rt.state(), &rt.state().snippets())?;
        }

        Commands::Users { command } => match command {
            UsersCommand::Search { query } => {
                load(&mut rt, [Action::SearchUsers(query)]).await;
                out.print_unless_failed(rt.state(), rt.state().user_matches())?;
            }
            UsersCommand::Live => {
                load(&mut rt, [Action::ReloadLiveUsers]).await;
                out.print_unless_failed(rt.state(), rt.state().store.get::<LiveUser>())?;
            }
        },

        Commands::Logs { follow } => {
            load(&mut rt, [Action::ReloadLogs]).await;
            if follow {
                for row in rt.state().logs.rows() {
                    out.line(row)?;
                }
                out.notices(rt.state_mut());
                follow_logs(&mut rt, &mut out).await?;
            } else {
                out.print_unless_failed(rt.state(), &rt.state().logs.to_vec())?;
            }
        }

        Commands::Birthdays => {
            load(&mut rt, [Action::ReloadBirthdays]).await;
            out.print_unless_failed(rt.state(), &rt.state().birthdays)?;
        }

        Commands::Message { channel, content } => {
            let form = GuildForm::Message(MessageForm {
                channel_id: channel,
                content,
            });
            load(&mut rt, [Action::SubmitForm(form)]).await;
        }
        Commands::Embed {
            channel,
            title,
            description,
            color,
            footer,
            thumbnail,
            image,
            fields,
        } => {
            let form = GuildForm::Embed(EmbedForm {
                channel_id: channel,
                title,
                description,
                color,
                footer,
                thumbnail,
                image,
                fields: parse_embed_fields(&fields.join("\n")),
            });
            load(&mut rt, [Action::SubmitForm(form)]).await;
        }
        Commands::Timeout {
            user,
            moderator,
            minutes,
            reason,
        } => {
            let form = GuildForm::Timeout(TimeoutForm {
                user_id: user,
                moderator_id: moderator,
                minutes,
                reason,
            });
            load(&mut rt, [Action::SubmitForm(form)]).await;
        }
        Commands::Kick {
            user,
            moderator,
            reason,
        } => {
            let form = GuildForm::Kick(KickForm {
                user_id: user,
                moderator_id: moderator,
                reason,
            });
            load(&mut rt, [Action::SubmitForm(form)]).await;
        }
        Commands::Ban {
            user,
            moderator,
            delete_days,
            reason,
        } => {
            let form = GuildForm::Ban(BanForm {
                user_id: user,
                moderator_id: moderator,
                delete_days,
                reason,
            });
            load(&mut rt, [Action::SubmitForm(form)]).await;
        }
        Commands::Purge {
            channel,
            moderator,
            amount,
            user,
        } => {
            let form = GuildForm::Purge(PurgeForm {
                channel_id: channel,
                moderator_id: moderator,
                amount,
                user_id: user,
            });
            load(&mut rt, [Action::SubmitForm(form)]).await;
        }
        Commands::RoleAdd { user, role } => {
            let form = GuildForm::RoleAdd(RoleForm {
                user_id: user,
                role_id: role,
            });
            load(&mut rt, [Action::SubmitForm(form)]).await;
        }
        Commands::RoleRemove { user, role } => {
            let form = GuildForm::RoleRemove(RoleForm {
                user_id: user,
                role_id: role,
            });
            load(&mut rt, [Action::SubmitForm(form)]).await;
        }
    }

    out.notices(rt.state_mut());
    Ok(out.succeeded())
}

/// Dispatch `actions` in order and wait for every request and follow-up
async fn load<const N: usize>(rt: &mut ConsoleRuntime, actions: [Action; N]) {
    for action in actions {
        rt.dispatch(action);
    }
    rt.settle().await;
}

/// Print pushed log events until the feed closes or Ctrl-C
async fn follow_logs(rt: &mut ConsoleRuntime, out: &mut Output) -> Result<()> {
    rt.dispatch(Action::ConnectLiveLogs);
    out.notices(rt.state_mut());
    if rt.state().feed.state() == FeedState::Disconnected {
        return Ok(());
    }

    loop {
        tokio::select! {
            handled = rt.next_event() => {
                let Some(handled) = handled else { break };
                let done = match handled {
                    Handled::Feed(FeedOutcome::Prepended) => {
                        if let Some(row) = rt.state().logs.rows().next() {
                            out.line(row)?;
                        }
                        false
                    }
                    Handled::Feed(FeedOutcome::State(FeedState::Disconnected))
                    | Handled::Feed(FeedOutcome::Failed(_)) => true,
                    _ => false,
                };
                out.notices(rt.state_mut());
                if done {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted, leaving live log feed");
                break;
            }
        }
    }
    Ok(())
}
