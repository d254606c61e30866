use crate::app::Controller;
use crate::audio::Backend;
use crate::mpris::{MprisHandle, PlayerStatus};

pub fn player_status<B: Backend>(controller: &Controller<B>) -> PlayerStatus {
    let state = controller.state();
    PlayerStatus {
        status: controller.status(),
        volume: f64::from(state.volume),
        looped: state.looped,
        shuffled: state.shuffled,
        position: state.time,
    }
}

pub fn update_mpris<B: Backend>(mpris: &MprisHandle, controller: &Controller<B>) {
    let index = controller.has_session().then(|| controller.current());
    mpris.set_track_metadata(index, controller.current_track(), controller.state().duration);
    mpris.set_status(player_status(controller));
}
