use rocket::{Build, Rocket};

#[rocket::launch]
fn launch() -> Rocket<Build> {
    clinic_portal::rocket()
}
