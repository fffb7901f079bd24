use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::realtime::ChangeFeed;
use crate::store::profiles::Gender;
use crate::{icon::Icon, include_res, res, session::SessionContext, AppResult};

use super::wizard::{Step, Wizard};

const WIZARD_KEY: &str = "onboarding";

async fn load_wizard(session: &Session) -> AppResult<Wizard> {
    Ok(session.get::<Wizard>(WIZARD_KEY).await?.unwrap_or_default())
}

async fn save_wizard(session: &Session, wizard: &Wizard) -> AppResult<()> {
    session.insert(WIZARD_KEY, wizard).await?;
    Ok(())
}

async fn clear_wizard(session: &Session) -> AppResult<()> {
    let _: Option<Wizard> = session.remove(WIZARD_KEY).await?;
    Ok(())
}

/// Landing page: signed-in devices go straight to the feed, everyone else
/// sees the wizard's current step.
#[debug_handler]
pub(crate) async fn landing(session: Session) -> AppResult<Response> {
    let context = SessionContext::new(session.clone());
    if context.hydrate().await?.is_some() {
        return Ok(Redirect::to("/feed").into_response());
    }
    let wizard = load_wizard(&session).await?;
    Ok(render_step(&wizard))
}

fn render_step(wizard: &Wizard) -> Response {
    let error = res::error_block(wizard.error.as_deref());
    match &wizard.step {
        Step::StudentId | Step::WelcomeBack(_) | Step::Done(_) => {
            Html(include_res!(str, "/pages/login.html").replace("{error}", &error)).into_response()
        }
        Step::Register { student_id } => Html(
            include_res!(str, "/pages/register.html")
                .replace("{student_id}", &res::escape(student_id))
                .replace("{error}", &error),
        )
        .into_response(),
        Step::SelectIcon { nickname, .. } => Html(
            include_res!(str, "/pages/icon.html")
                .replace("{nickname}", &res::escape(nickname))
                .replace("{error}", &error),
        )
        .into_response(),
    }
}

fn welcome_back(wizard: &Wizard) -> Response {
    let Some(profile) = wizard.profile() else {
        return Redirect::to("/").into_response();
    };
    Html(
        include_res!(str, "/pages/welcome_back.html")
            .replace("{nickname}", &res::escape(&profile.nickname))
            .replace("{icon}", &profile.icon.html()),
    )
    .into_response()
}

#[derive(Deserialize)]
pub(crate) struct LookupForm {
    student_id: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn lookup(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Form(LookupForm { student_id }): Form<LookupForm>,
) -> AppResult<Response> {
    let mut wizard = load_wizard(&session).await?;
    wizard.submit_student_id(&db_pool, &student_id).await;

    if let Step::WelcomeBack(profile) = &wizard.step {
        SessionContext::new(session.clone()).sign_in(profile).await?;
        clear_wizard(&session).await?;
        return Ok(welcome_back(&wizard));
    }
    save_wizard(&session, &wizard).await?;
    Ok(Redirect::to("/").into_response())
}

#[derive(Deserialize)]
pub(crate) struct RegisterForm {
    nickname: String,
    gender: Option<String>,
}

#[debug_handler]
pub(crate) async fn register(
    session: Session,
    Form(RegisterForm { nickname, gender }): Form<RegisterForm>,
) -> AppResult<Response> {
    let mut wizard = load_wizard(&session).await?;
    let gender = gender.as_deref().and_then(Gender::parse);
    wizard.submit_registration(&nickname, gender);
    save_wizard(&session, &wizard).await?;
    Ok(Redirect::to("/").into_response())
}

#[derive(Deserialize)]
pub(crate) struct IconForm {
    icon: String,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn select_icon(
    State(db_pool): State<SqlitePool>,
    State(changes): State<ChangeFeed>,
    session: Session,
    Form(IconForm { icon }): Form<IconForm>,
) -> AppResult<Response> {
    let mut wizard = load_wizard(&session).await?;
    wizard.select_icon(&db_pool, &changes, Icon::parse(&icon)).await;

    match &wizard.step {
        Step::Done(profile) => {
            SessionContext::new(session.clone()).sign_in(profile).await?;
            clear_wizard(&session).await?;
            Ok(Redirect::to("/feed").into_response())
        }
        // Lost the registration race; greet the returning user instead.
        Step::WelcomeBack(profile) => {
            SessionContext::new(session.clone()).sign_in(profile).await?;
            clear_wizard(&session).await?;
            Ok(welcome_back(&wizard))
        }
        _ => {
            save_wizard(&session, &wizard).await?;
            Ok(Redirect::to("/").into_response())
        }
    }
}
