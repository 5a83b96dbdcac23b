use actix_web::{
    App,
    HttpRequest,
    HttpResponse,
    Json,
    Path,
    http::{Method, StatusCode},
};

use crate::models::{
    User,
    user::PublicData as UserData,
};
use super::{
    Error,
    RouteExt,
    RouterExt,
    State,
    session::{Normal, Session},
    util::FormOrJson,
};

/// Configure routes.
pub fn routes(app: App<State>) -> App<State> {
    app
        .api_route("/users", Method::GET, list_users)
        .resource("/users/me", |r| {
            r.get().api_with(get_current_user);
        })
        .api_route("/users/{id}", Method::GET, get_user)
        .api_route("/login", Method::POST, login)
        .api_route("/logout", Method::POST, logout)
}

type Result<T, E=Error> = std::result::Result<T, E>;

/// List all users.
///
/// ## Method
///
/// ```text
/// GET /users
/// ```
pub fn list_users(
    state: actix_web::State<State>,
    _session: Session,
) -> Result<Json<Vec<UserData>>> {
    let db = state.db.get()?;
    let users = User::all(&*db)?;

    Ok(Json(users.iter().map(User::get_public).collect()))
}

/// Get the user owning the current session.
///
/// ## Method
///
/// ```text
/// GET /users/me
/// ```
pub fn get_current_user(
    state: actix_web::State<State>,
    session: Session,
) -> Result<Json<UserData>> {
    let db = state.db.get()?;
    let user = session.user(&*db)?;

    Ok(Json(user.get_public()))
}

/// Get a user by ID.
///
/// ## Method
///
/// ```text
/// GET /users/:id
/// ```
pub fn get_user(
    state: actix_web::State<State>,
    _session: Session,
    id: Path<i32>,
) -> Result<Json<UserData>> {
    let db = state.db.get()?;
    let user = User::by_id(&*db, *id)?;

    Ok(Json(user.get_public()))
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    email: String,
    password: String,
}

/// Authenticate and open a new session.
///
/// ## Method
///
/// ```text
/// POST /login
/// ```
pub fn login(
    req: HttpRequest<State>,
    state: actix_web::State<State>,
    form: FormOrJson<LoginData>,
) -> Result<Json<UserData>> {
    let db = state.db.get()?;
    let form = form.into_inner();

    let user = User::authenticate(&*db, &form.email, &form.password)?;

    Session::<Normal>::create(&req, &user);

    Ok(Json(user.get_public()))
}

/// Close the current session.
///
/// ## Method
///
/// ```text
/// POST /logout
/// ```
pub fn logout(
    req: HttpRequest<State>,
    session: Session,
) -> Result<HttpResponse> {
    Session::destroy(&req, session);

    Ok(HttpResponse::new(StatusCode::NO_CONTENT))
}
