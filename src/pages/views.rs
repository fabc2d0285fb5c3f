use crate::auth::claims::SessionClaims;
use crate::users::User;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title}</title>
</head>
<body>
  <nav><a href="/">Home</a> | <a href="/users">Users</a></nav>
  <main>
{body}
  </main>
</body>
</html>
"#,
        title = escape(title),
        body = body
    )
}

fn user_table(users: &[User]) -> String {
    if users.is_empty() {
        return "<p>No users yet.</p>".into();
    }
    let mut rows = String::new();
    for u in users {
        let id = u.id.map(|i| i.to_string()).unwrap_or_default();
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            id,
            escape(&u.username),
            escape(&u.email)
        ));
    }
    format!(
        "<table>\n<thead><tr><th>ID</th><th>Username</th><th>Email</th></tr></thead>\n<tbody>{rows}</tbody>\n</table>"
    )
}

pub fn index(signed_in: Option<&SessionClaims>) -> String {
    let action = match signed_in {
        Some(c) => format!(
            r#"<p>Signed in as {}. <a href="/home">Continue</a></p>"#,
            escape(c.login())
        ),
        None => r#"<p><a href="/login">Sign in</a></p>"#.to_string(),
    };
    layout("Web App", &format!("<h1>Web App</h1>\n{action}"))
}

pub fn login(oauth_enabled: bool) -> String {
    let body = if oauth_enabled {
        r#"<h1>Sign in</h1>
<p><a href="/oauth2/authorization/github">Sign in with GitHub</a></p>"#
    } else {
        "<h1>Sign in</h1>\n<p>Login is not configured on this server.</p>"
    };
    layout("Sign in", body)
}

pub fn home(claims: &SessionClaims, users: &[User]) -> String {
    let name = claims.name.as_deref().unwrap_or(claims.login());
    let mut profile = format!("<h1>Welcome, {}</h1>\n<ul>", escape(name));
    profile.push_str(&format!("<li>Login: {}</li>", escape(claims.login())));
    if let Some(email) = &claims.email {
        profile.push_str(&format!("<li>Email: {}</li>", escape(email)));
    }
    profile.push_str("</ul>");
    if let Some(avatar) = &claims.avatar_url {
        profile.push_str(&format!(
            r#"<img src="{}" alt="avatar" width="64" height="64">"#,
            escape(avatar)
        ));
    }
    let body = format!(
        "{profile}\n<form method=\"post\" action=\"/logout\"><button>Sign out</button></form>\n<h2>Users</h2>\n{}",
        user_table(users)
    );
    layout("Home", &body)
}

pub fn users(users: &[User]) -> String {
    layout("Users", &format!("<h1>Users</h1>\n{}", user_table(users)))
}
