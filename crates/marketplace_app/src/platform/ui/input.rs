//! Line commands typed at the prompt.

use marketplace_core::{Msg, PostId, Role, Route};

pub const HELP: &str = "\
commands:
  signin <email> <password>
  signup <name> <email> <password> <customer|professional>
  signout
  go <route>            e.g. main/feed, creator/<id>, package/<id>, chat/<id>, booking/<id>
  refresh
  like <post> | share <post> | comment <post> <text...>
  dismiss
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Dispatch(Msg),
    Help,
    Quit,
    /// Could not be understood; carries a message for the user.
    Invalid(String),
}

pub fn parse(line: &str) -> Input {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Input::Dispatch(Msg::NoOp);
    };
    let args: Vec<&str> = words.collect();

    match (command.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("help" | "?", _) => Input::Help,
        ("quit" | "exit", _) => Input::Quit,
        ("signin", [email, password]) => Input::Dispatch(Msg::SignInSubmitted {
            email: email.to_string(),
            password: password.to_string(),
        }),
        ("signup", [name, email, password, role]) => match role.parse::<Role>() {
            Ok(role) => Input::Dispatch(Msg::SignUpSubmitted {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role,
            }),
            Err(err) => Input::Invalid(err.to_string()),
        },
        ("signout", []) => Input::Dispatch(Msg::SignOutClicked),
        ("go", [route]) => match route.parse::<Route>() {
            Ok(route) => Input::Dispatch(Msg::Navigate(route)),
            Err(err) => Input::Invalid(err.to_string()),
        },
        ("refresh", []) => Input::Dispatch(Msg::PullToRefresh),
        ("like", [post]) => Input::Dispatch(Msg::LikeTapped(PostId::new(*post))),
        ("share", [post]) => Input::Dispatch(Msg::ShareTapped(PostId::new(*post))),
        ("comment", [post, body @ ..]) => Input::Dispatch(Msg::CommentSubmitted {
            post_id: PostId::new(*post),
            body: body.join(" "),
        }),
        ("dismiss", []) => Input::Dispatch(Msg::DismissError),
        (other, _) => Input::Invalid(format!("unknown command or arguments: {other}")),
    }
}
