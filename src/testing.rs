//! page fixtures for client tests.

pub use wallhaven_core::testing::{Reply, Seen, serve};

pub fn wallpaper_page(id: &str, image_src: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html><body>
<main id="main">
  <section id="showcase">
    <img id="wallpaper" src="{image_src}" alt="wallpaper">
  </section>
  <input id="wallpaper-short-url-copy" type="text" value="https://whvn.cc/{id}">
  <div class="showcase-resolution"> 1920 x 1080 </div>
  <div class="showcase-source">Source: <a href="https://example.com/art">example.com/art</a></div>
  <ul class="color-palette">
    <li class="color" style="background-color:#424153"></li>
    <li class="color" style="background-color:#e7d8b1"></li>
  </ul>
  <ul id="tags">
    <li class="tag" data-tag-id="37"><a class="tagname" href="/tag/37">landscape</a></li>
    <li class="tag" data-tag-id="711"><a class="tagname" href="/tag/711">mountains</a></li>
  </ul>
  <form id="wallpaper-purity-form"><fieldset>
    <input type="radio" id="purity-sfw" checked="checked"><label for="purity-sfw">SFW</label>
    <input type="radio" id="purity-sketchy"><label for="purity-sketchy">Sketchy</label>
  </fieldset></form>
  <aside id="showcase-sidebar"><div><div><dl>
    <dt>Uploader</dt>
    <dd><a class="username" href="/user/alice">alice</a><time datetime="2016-03-01T12:00:00+00:00">3 years ago</time></dd>
    <dt>Category</dt><dd>General</dd>
    <dt>Size</dt><dd>1.2 MiB</dd>
    <dt>Views</dt><dd>1,024</dd>
    <dt>Favorites</dt><dd><a href="/favorites">42</a></dd>
    <dt>Mystery</dt><dd>ignored</dd>
  </dl></div></div></aside>
</main>
</body></html>"##
    )
}

pub fn user_page(name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><body>
<div id="user"><h1><a href="/user/{name}">{name}</a></h1><h4>Member</h4></div>
<div id="profile-content">
  <div>about me</div>
  <div><div>
    <dl class="datalist">
      <dt>Joined</dt><dd><time datetime="2014-01-02T00:00:00+00:00">long ago</time></dd>
      <dt>Last Active</dt><dd><time datetime="2019-05-05T10:00:00+00:00">a while ago</time></dd>
    </dl>
    <dl class="datalist">
      <dt>Profile Views</dt><dd>1,337</dd>
      <dt>Uploads</dt><dd>12</dd>
      <dt>Forum Posts</dt><dd>3</dd>
      <dt>Shoe Size</dt><dd>44</dd>
    </dl>
  </div></div>
</div>
</body></html>"#
    )
}

pub fn listing_page(links: &[String]) -> String {
    let figures = links
        .iter()
        .map(|href| format!(r#"<figure><a class="preview" href="{href}"></a></figure>"#))
        .collect::<String>();
    format!("<html><body><section class=\"thumb-listing-page\">{figures}</section></body></html>")
}

pub fn login_page(token: &str) -> String {
    format!(
        r#"<html><body><form id="login" method="post" action="/auth/login"><input type="hidden" name="_token" value="{token}"><input name="username"></form></body></html>"#
    )
}
