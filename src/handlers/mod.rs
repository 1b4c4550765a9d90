// Handlers are grouped by the access tier their routes sit behind:
// public (no token), protected (valid session token), elevated (admin role).

pub mod elevated;
pub mod protected;
pub mod public;
pub mod utils;
