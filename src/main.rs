fn main() {
    bullet_hell::game::run();
}
